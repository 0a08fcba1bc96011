//! Command-line surface shared by the `choose-paper` binary and its tests.
//!
//! The binary is a thin shim: parse [`Cli`], set up logging, build an
//! [`OpenAiClient`](crate::OpenAiClient) and hand everything to [`run`].
//! Keeping `run` in the library lets the integration tests drive the whole
//! CLI path with a stub completion client and in-memory stdin/stdout.

use crate::config::{ReviewConfig, DEFAULT_TONE};
use crate::error::ReviewError;
use crate::output::{format_report, write_report, OutputPayload, ReviewRun, Surface};
use crate::pipeline::input::{ContentKind, PaperSource, ResolveOptions};
use crate::pipeline::llm::CompletionClient;
use crate::review::review_with_stdin;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

const AFTER_HELP: &str = r#"EXAMPLES:
  choose-paper paper.pdf
  choose-paper https://arxiv.org/pdf/1706.03762 --domain NLP -o review.txt
  cat notes.txt | choose-paper - --language zh
  choose-paper paper.pdf --base-url https://api.deepseek.com --model deepseek-chat

ENVIRONMENT:
  OPENAI_API_KEY    API key for the completion endpoint
  OPENAI_BASE_URL   OpenAI-compatible base URL (default https://api.openai.com/v1)
  OPENAI_MODEL      Model name (default gpt-4o-mini)
  RUST_LOG          Log filter override (logs go to stderr)
"#;

/// Review a research paper with an LLM and print reading recommendations.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "choose-paper",
    version,
    about = "Review a research paper with an LLM and decide whether to read it",
    long_about = "Review a research paper (local PDF/text file, URL, or stdin) with any \
OpenAI-compatible chat model. Prints a plain-text review with summary, strengths, \
weaknesses, questions and a reading decision.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
pub struct Cli {
    /// Paper path, `-` for stdin, or an HTTP/HTTPS URL.
    pub paper: String,

    /// Research domain of the paper (e.g. ML, CV, NLP).
    #[arg(long, default_value = "ML")]
    pub domain: String,

    /// Review language (`zh` selects the Chinese template).
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Reviewer persona injected into the prompt.
    #[arg(long, default_value = DEFAULT_TONE)]
    pub tone: String,

    /// Chat model name.
    #[arg(long, env = "OPENAI_MODEL", default_value = crate::config::DEFAULT_MODEL)]
    pub model: String,

    /// API key for the completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.2)]
    pub temperature: f32,

    /// Force the paper type instead of inferring it.
    #[arg(long, value_enum)]
    pub paper_type: Option<PaperTypeArg>,

    /// Write the review to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the JSON payload (text, model, timestamp, usage, paper) instead of plain text.
    #[arg(long)]
    pub json: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub download_timeout: u64,

    /// Completion call timeout in seconds.
    #[arg(long, default_value_t = 120)]
    pub api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperTypeArg {
    Pdf,
    Text,
}

impl From<PaperTypeArg> for ContentKind {
    fn from(v: PaperTypeArg) -> Self {
        match v {
            PaperTypeArg::Pdf => ContentKind::Pdf,
            PaperTypeArg::Text => ContentKind::Text,
        }
    }
}

impl Cli {
    /// Default log filter: stdout carries the report, so only warnings
    /// reach stderr unless asked otherwise.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Map CLI args to a validated [`ReviewConfig`].
    pub fn review_config(&self) -> Result<ReviewConfig, ReviewError> {
        let mut builder = ReviewConfig::builder()
            .domain(&self.domain)
            .language(&self.language)
            .tone(&self.tone)
            .model(&self.model)
            .temperature(self.temperature)
            .api_timeout_secs(self.api_timeout)
            .download_timeout_secs(self.download_timeout);
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            kind_override: self.paper_type.map(ContentKind::from),
            download_timeout_secs: self.download_timeout,
        }
    }
}

/// Run one review for `cli`.
///
/// The report goes to `--output` (atomically) or to `stdout`; the
/// "Saved review to" notice goes to `stderr` unless `--quiet`.
pub async fn run<R, O, E>(
    cli: &Cli,
    client: &dyn CompletionClient,
    stdin: R,
    stdout: &mut O,
    stderr: &mut E,
) -> Result<ReviewRun, ReviewError>
where
    R: AsyncRead + Unpin,
    O: Write,
    E: Write,
{
    let config = cli.review_config()?;
    let source = PaperSource::parse(&cli.paper);
    let run = review_with_stdin(&source, &cli.resolve_options(), &config, client, stdin).await?;

    let surface = if cli.json { Surface::Web } else { Surface::Cli };
    let report = match format_report(&run.result, surface) {
        OutputPayload::Text(text) => text,
        OutputPayload::Web(payload) => {
            serde_json::to_string_pretty(&payload.with_paper(run.paper.clone()))
                .map_err(|e| stdout_error(std::io::Error::other(e)))?
        }
    };

    match cli.output {
        Some(ref path) => {
            write_report(path, &report).await?;
            if !cli.quiet {
                // Best effort: the review is already on disk.
                let _ = writeln!(stderr, "Saved review to {}", path.display());
            }
        }
        None => {
            stdout.write_all(report.as_bytes()).map_err(stdout_error)?;
            if !report.ends_with('\n') {
                stdout.write_all(b"\n").map_err(stdout_error)?;
            }
            stdout.flush().map_err(stdout_error)?;
        }
    }

    Ok(run)
}

fn stdout_error(source: std::io::Error) -> ReviewError {
    ReviewError::Write {
        path: Path::new("<stdout>").to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("choose-paper").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["paper.pdf", "--api-key", "k"]);
        assert_eq!(cli.domain, "ML");
        assert_eq!(cli.language, "en");
        assert_eq!(cli.download_timeout, 30);
        assert_eq!(cli.api_timeout, 120);
        assert_eq!(cli.log_filter(), "warn");
        assert!(cli.resolve_options().kind_override.is_none());
    }

    #[test]
    fn flags_map_to_config() {
        let cli = parse(&[
            "-",
            "--domain",
            "CV",
            "--language",
            "zh",
            "--api-key",
            "k",
            "--model",
            "deepseek-chat",
            "--base-url",
            "https://api.deepseek.com",
            "--paper-type",
            "pdf",
            "--temperature",
            "0.7",
            "-v",
        ]);
        let config = cli.review_config().unwrap();
        assert_eq!(config.domain, "CV");
        assert_eq!(config.language, "zh");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.base_url.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(config.temperature, 0.7);
        assert_eq!(cli.resolve_options().kind_override, Some(ContentKind::Pdf));
        assert_eq!(cli.log_filter(), "debug");
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let res = Cli::try_parse_from(["choose-paper", "x", "-q", "-v"]);
        assert!(res.is_err());
    }

    #[test]
    fn unknown_paper_type_rejected() {
        let res = Cli::try_parse_from(["choose-paper", "x", "--paper-type", "docx"]);
        assert!(res.is_err());
    }
}
