//! # choose-paper
//!
//! Decide whether a research paper is worth reading: extract its text, ask an
//! OpenAI-compatible chat model for a strict reviewer's assessment, and hand
//! back the review as plain text (CLI) or JSON (web).
//!
//! ## Why this crate?
//!
//! Skimming abstracts does not scale, and a reviewer-style summary with
//! strengths, weaknesses and a reading decision is a better filter. The model
//! sees the full paper text in one prompt, so the library stays a thin,
//! predictable pipeline around a single completion call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! paper reference (path | - | URL) or upload
//!  │
//!  ├─ 1. Resolve   read file / stdin, or download the URL
//!  ├─ 2. Extract   pdf-extract on spawn_blocking, or strict UTF-8 text
//!  ├─ 3. Build     role + tone + domain/language template + full text
//!  ├─ 4. Complete  one POST {base_url}/chat/completions, no retry
//!  └─ 5. Format    plain text for the terminal, JSON for the browser
//! ```
//!
//! Every stage failure is terminal and reported as a [`ReviewError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use choose_paper::{review, OpenAiClient, PaperSource, ResolveOptions, ReviewConfig, ReviewDefaults};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReviewConfig::builder()
//!         .domain("NLP")
//!         .defaults(&ReviewDefaults::from_env())
//!         .build()?;
//!     let source = PaperSource::parse("https://arxiv.org/pdf/1706.03762");
//!     let run = review(&source, &ResolveOptions::default(), &config, &OpenAiClient::new()).await?;
//!     println!("{}", run.result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | `choose-paper` binary and [`cli`] module (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | `choose-paper-server` binary and [`server`] module (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! choose-paper = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod review;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Language, ReviewConfig, ReviewConfigBuilder, ReviewDefaults};
pub use error::ReviewError;
pub use output::{
    format_report, write_report, OutputPayload, PaperSummary, ReviewResult, ReviewRun, Surface,
    TokenUsage, WebPayload,
};
pub use pipeline::extract::{extract, ExtractedText};
pub use pipeline::input::{resolve, ContentKind, PaperSource, RawDocument, ResolveOptions};
pub use pipeline::llm::{CompletionClient, OpenAiClient};
pub use prompts::{build_prompt, Prompt};
pub use review::{review, review_document, review_with_stdin};
