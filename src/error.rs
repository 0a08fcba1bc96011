//! Error type for the choose-paper library.
//!
//! Every stage of the review pipeline reports failure through the single
//! [`ReviewError`] enum. Each failure is terminal for the request that hit it:
//! nothing is retried internally and no partial report is ever returned.
//!
//! The entry points render an error with its `Display` impl (one line, cause
//! included) and use [`ReviewError::kind`], [`ReviewError::http_status`] and
//! [`ReviewError::exit_code`] to pick the wire representation.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the choose-paper library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// Local paper path does not exist.
    #[error("paper not found: '{}'", .path.display())]
    NotFound { path: PathBuf },

    /// Reading a local file or stdin failed.
    #[error("failed to read {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// Downloading a remote paper failed (non-2xx status or network error).
    #[error("failed to fetch '{url}': {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Bytes declared as PDF could not be parsed.
    #[error("could not parse PDF {origin}: {detail}")]
    Parse { origin: String, detail: String },

    /// Bytes declared as text are not valid UTF-8.
    #[error("{origin} is not valid UTF-8: {detail}")]
    Decode { origin: String, detail: String },

    /// Extraction succeeded but produced no non-whitespace characters.
    #[error("paper text is empty ({origin}); provide a PDF/text file, a URL or stdin input")]
    EmptyContent { origin: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required configuration value is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    // ── Completion errors ─────────────────────────────────────────────────
    /// The completion call did not finish within the configured timeout.
    #[error("completion request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The endpoint rejected the credentials (401/403).
    #[error("authentication rejected by the completion endpoint (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// The endpoint throttled the request (429).
    #[error("rate limited by the completion endpoint{}", retry_hint(.retry_after_secs))]
    RateLimit { retry_after_secs: Option<u64> },

    /// Any other non-2xx status, transport failure or malformed body.
    #[error("completion endpoint error: {0}")]
    Upstream(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The report could not be written to the requested path.
    #[error("failed to write report to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

impl ReviewError {
    /// Stable snake_case name of the failure class, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ReviewError::NotFound { .. } => "not_found",
            ReviewError::Read { .. } => "read_error",
            ReviewError::Fetch { .. } => "fetch_error",
            ReviewError::Parse { .. } => "parse_error",
            ReviewError::Decode { .. } => "decode_error",
            ReviewError::EmptyContent { .. } => "empty_content",
            ReviewError::Config(_) => "config_error",
            ReviewError::Timeout { .. } => "timeout",
            ReviewError::Auth { .. } => "auth_error",
            ReviewError::RateLimit { .. } => "rate_limit",
            ReviewError::Upstream(_) => "upstream_error",
            ReviewError::Write { .. } => "write_error",
        }
    }

    /// HTTP status the web surface answers with for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            ReviewError::NotFound { .. } => 404,
            ReviewError::Read { .. } | ReviewError::Write { .. } => 500,
            ReviewError::Fetch { .. } | ReviewError::Upstream(_) => 502,
            ReviewError::Parse { .. } | ReviewError::Decode { .. } | ReviewError::Config(_) => 400,
            ReviewError::EmptyContent { .. } => 422,
            ReviewError::Timeout { .. } => 504,
            ReviewError::Auth { .. } => 401,
            ReviewError::RateLimit { .. } => 429,
        }
    }

    /// Process exit code the CLI uses for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReviewError::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReviewError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_display_carries_reason() {
        let e = ReviewError::Fetch {
            url: "https://example.com/a.pdf".into(),
            status: Some(404),
            reason: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("example.com/a.pdf"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn rate_limit_display_with_retry() {
        let e = ReviewError::RateLimit {
            retry_after_secs: Some(30),
        };
        assert!(e.to_string().contains("retry after 30s"));
    }

    #[test]
    fn rate_limit_display_without_retry() {
        let e = ReviewError::RateLimit {
            retry_after_secs: None,
        };
        assert_eq!(e.to_string(), "rate limited by the completion endpoint");
    }

    #[test]
    fn auth_display() {
        let e = ReviewError::Auth {
            status: 401,
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("401"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn messages_are_single_line() {
        let errors = [
            ReviewError::NotFound {
                path: "missing.txt".into(),
            },
            ReviewError::EmptyContent {
                origin: "<stdin>".into(),
            },
            ReviewError::Timeout { secs: 120 },
            ReviewError::Config("api key is required".into()),
        ];
        for e in errors {
            assert!(!e.to_string().contains('\n'), "multi-line: {e}");
        }
    }

    #[test]
    fn status_and_exit_mapping() {
        assert_eq!(ReviewError::Config("x".into()).http_status(), 400);
        assert_eq!(ReviewError::Config("x".into()).exit_code(), 2);
        assert_eq!(ReviewError::Timeout { secs: 1 }.http_status(), 504);
        assert_eq!(ReviewError::Timeout { secs: 1 }.exit_code(), 1);
        assert_eq!(
            ReviewError::RateLimit {
                retry_after_secs: None
            }
            .http_status(),
            429
        );
        assert_eq!(ReviewError::Upstream("boom".into()).kind(), "upstream_error");
    }
}
