//! Web server binary for choose-paper.
//!
//! Serves the upload page and `POST /review`. Credentials and model defaults
//! come from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`, read once
//! at start-up; each request may override them through the form.

use anyhow::{Context, Result};
use choose_paper::server::{self, AppState, DEFAULT_MAX_UPLOAD_MB};
use choose_paper::{OpenAiClient, ReviewDefaults};
use clap::Parser;
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Serve the choose-paper web UI and review API.
#[derive(Parser, Debug)]
#[command(name = "choose-paper-server", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "CHOOSE_PAPER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "CHOOSE_PAPER_PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum request body size in MiB.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let defaults = ReviewDefaults::from_env();
    if defaults.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; requests must supply api_key");
    }

    let state = AppState {
        defaults,
        client: Arc::new(OpenAiClient::new()),
    };
    let app = server::router(state, args.max_upload_mb.saturating_mul(1024 * 1024));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("choose-paper server listening on http://{addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
