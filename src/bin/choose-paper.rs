//! CLI binary for choose-paper.
//!
//! A thin shim over the library crate: parse flags, set up logging, run one
//! review with the OpenAI-compatible client and map failures to exit codes.

use anyhow::{Context, Result};
use choose_paper::cli::{self, Cli};
use choose_paper::{OpenAiClient, ReviewError};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries the report, so logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<ReviewError>()
                .map(ReviewError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    let client = OpenAiClient::new();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();

    let run = cli::run(cli, &client, tokio::io::stdin(), &mut stdout, &mut stderr)
        .await
        .context("review failed")?;

    tracing::info!(
        "Reviewed {} ({}, {} chars) with {} in {}ms",
        run.paper.origin,
        run.paper.kind,
        run.paper.text_chars,
        run.result.model,
        run.result.duration_ms
    );
    Ok(())
}
