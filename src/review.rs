//! Review entry points: run the full pipeline for one paper.
//!
//! The stages run strictly in order (resolve, extract, build, complete) and
//! the first failure ends the run. In particular nothing reaches the
//! completion client unless the paper text is non-empty and the prompt
//! rendered cleanly.

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::output::{PaperSummary, ReviewRun};
use crate::pipeline::extract;
use crate::pipeline::input::{self, PaperSource, RawDocument, ResolveOptions};
use crate::pipeline::llm::CompletionClient;
use crate::prompts::build_prompt;
use std::time::Instant;
use tokio::io::AsyncRead;
use tracing::info;

/// Review a paper given by path, URL or stdin.
///
/// # Errors
/// The first [`ReviewError`] raised by any stage.
pub async fn review(
    source: &PaperSource,
    options: &ResolveOptions,
    config: &ReviewConfig,
    client: &dyn CompletionClient,
) -> Result<ReviewRun, ReviewError> {
    review_with_stdin(source, options, config, client, tokio::io::stdin()).await
}

/// Like [`review`], reading [`PaperSource::Stdin`] from `stdin`.
pub async fn review_with_stdin<R>(
    source: &PaperSource,
    options: &ResolveOptions,
    config: &ReviewConfig,
    client: &dyn CompletionClient,
    stdin: R,
) -> Result<ReviewRun, ReviewError>
where
    R: AsyncRead + Unpin,
{
    info!("Starting review: {}", source.origin());
    let raw = input::resolve_with_stdin(source, options, stdin).await?;
    review_document(raw, config, client).await
}

/// Run extract → build → complete on bytes already in memory (uploads).
pub async fn review_document(
    raw: RawDocument,
    config: &ReviewConfig,
    client: &dyn CompletionClient,
) -> Result<ReviewRun, ReviewError> {
    let total_start = Instant::now();

    // ── Extract ──────────────────────────────────────────────────────────
    let text = extract::extract(&raw).await?;

    // ── Build prompt ─────────────────────────────────────────────────────
    let prompt = build_prompt(&text, config)?;
    info!(
        "Built prompt: {} chars (domain {}, language {})",
        prompt.as_str().chars().count(),
        config.domain,
        config.language
    );

    // ── Complete ─────────────────────────────────────────────────────────
    let result = client.complete(&prompt, config).await?;

    info!(
        "Review of {} finished in {}ms ({} chars from {})",
        raw.origin,
        total_start.elapsed().as_millis(),
        result.text.chars().count(),
        result.model
    );

    Ok(ReviewRun {
        result,
        paper: PaperSummary {
            origin: raw.origin,
            kind: raw.kind,
            text_chars: text.char_count(),
        },
    })
}
