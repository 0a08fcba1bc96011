//! Review results and the report formatter.
//!
//! [`ReviewResult`] is what the completion client hands back: the model's
//! text, treated as opaque, plus metadata. [`format_report`] wraps it for a
//! presentation [`Surface`] without touching the text itself.

use crate::error::ReviewError;
use crate::pipeline::input::ContentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Token accounting reported by the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// The model's review plus metadata about the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Raw completion text, never post-processed.
    pub text: String,
    /// Model that served the request (as reported by the endpoint when present).
    pub model: String,
    /// When the completion finished.
    pub created_at: DateTime<Utc>,
    /// Token usage, when the endpoint reports it.
    pub usage: Option<TokenUsage>,
    /// Wall-clock duration of the completion call.
    pub duration_ms: u64,
}

/// What was reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    /// Path, URL, `<stdin>` or upload file name.
    pub origin: String,
    pub kind: ContentKind,
    /// Characters of extracted text sent to the model.
    pub text_chars: usize,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRun {
    pub result: ReviewResult,
    pub paper: PaperSummary,
}

/// Presentation context for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Cli,
    Web,
}

/// JSON envelope returned to the browser (and by `--json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPayload {
    pub text: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<PaperSummary>,
}

impl WebPayload {
    /// Attach the paper summary from a pipeline run.
    pub fn with_paper(mut self, paper: PaperSummary) -> Self {
        self.paper = Some(paper);
        self
    }
}

/// Formatted report for one surface.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputPayload {
    /// Plain UTF-8 text for a terminal or file.
    Text(String),
    /// Structured payload for the web UI.
    Web(WebPayload),
}

impl OutputPayload {
    /// Serialise for transport: the text itself, or pretty JSON.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            OutputPayload::Text(text) => Ok(text.clone()),
            OutputPayload::Web(payload) => serde_json::to_string_pretty(payload),
        }
    }
}

/// Wrap a result for `surface`. The review text passes through untouched.
pub fn format_report(result: &ReviewResult, surface: Surface) -> OutputPayload {
    match surface {
        Surface::Cli => OutputPayload::Text(result.text.clone()),
        Surface::Web => OutputPayload::Web(WebPayload {
            text: result.text.clone(),
            model: result.model.clone(),
            created_at: result.created_at,
            usage: result.usage,
            paper: None,
        }),
    }
}

/// Write `contents` to `path` atomically.
///
/// The bytes go to a temp file in the destination directory which is then
/// renamed over `path`, so readers never observe a half-written report.
/// The temp-file work runs on the blocking pool.
pub async fn write_report(path: &Path, contents: &str) -> Result<(), ReviewError> {
    let write_err = |source: std::io::Error| ReviewError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await.map_err(write_err)?;

    let target = path.to_path_buf();
    let bytes = contents.as_bytes().to_vec();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| write_err(std::io::Error::other(e)))?
    .map_err(write_err)?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReviewResult {
        ReviewResult {
            text: "Summary: solid.\nDecision: Must Read".into(),
            model: "gpt-4o-mini".into(),
            created_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            usage: Some(TokenUsage {
                prompt_tokens: 1200,
                completion_tokens: 300,
            }),
            duration_ms: 4200,
        }
    }

    #[test]
    fn cli_is_pass_through() {
        let r = sample();
        assert_eq!(format_report(&r, Surface::Cli), OutputPayload::Text(r.text.clone()));
    }

    #[test]
    fn web_payload_has_text_and_model() {
        let payload = format_report(&sample(), Surface::Web);
        let json: serde_json::Value = serde_json::from_str(&payload.render().unwrap()).unwrap();
        assert_eq!(json["text"], "Summary: solid.\nDecision: Must Read");
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["usage"]["prompt_tokens"], 1200);
        assert!(json.get("paper").is_none());
    }

    #[test]
    fn web_payload_with_paper() {
        let OutputPayload::Web(payload) = format_report(&sample(), Surface::Web) else {
            panic!("expected web payload");
        };
        let payload = payload.with_paper(PaperSummary {
            origin: "paper.pdf".into(),
            kind: ContentKind::Pdf,
            text_chars: 42,
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["paper"]["kind"], "pdf");
        assert_eq!(json["paper"]["text_chars"], 42);
    }

    #[tokio::test]
    async fn write_report_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/review.txt");
        write_report(&path, "Recommendation: read sections 3-4 first.")
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Recommendation: read sections 3-4 first."
        );
        // Overwrite in place.
        write_report(&path, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // No temp files are left beside the report.
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn write_report_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_report(&blocker.join("review.txt"), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Write { .. }), "got: {err:?}");
    }
}
