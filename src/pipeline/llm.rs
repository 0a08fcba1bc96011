//! Completion call: send the rendered prompt to an OpenAI-compatible
//! chat-completion endpoint and return the review text.
//!
//! The network call sits behind [`CompletionClient`] so the pipeline can be
//! driven by a deterministic stub in tests. [`OpenAiClient`] is the
//! production implementation: one `POST {base_url}/chat/completions` per
//! review, the prompt as the only user message, no retry.
//!
//! ## Status mapping
//!
//! | Response | Error |
//! |----------|-------|
//! | timeout | [`ReviewError::Timeout`] |
//! | 401 / 403 | [`ReviewError::Auth`] |
//! | 429 | [`ReviewError::RateLimit`] |
//! | other non-2xx, transport failure, bad body, empty content | [`ReviewError::Upstream`] |

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::output::{ReviewResult, TokenUsage};
use crate::prompts::Prompt;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Endpoint used when the config carries no base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest slice of an error body quoted back in a diagnostic.
const ERROR_BODY_LIMIT: usize = 300;

/// One stateless completion per call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as a single user message using `config`'s model,
    /// credentials and endpoint.
    async fn complete(
        &self,
        prompt: &Prompt,
        config: &ReviewConfig,
    ) -> Result<ReviewResult, ReviewError>;
}

/// [`CompletionClient`] for any OpenAI-compatible `/chat/completions` API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    default_base_url: String,
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::with_default_base_url(DEFAULT_BASE_URL)
    }

    /// Use `base_url` whenever a request's config does not name one.
    pub fn with_default_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            default_base_url: base_url.into(),
        }
    }

    fn endpoint(&self, config: &ReviewConfig) -> String {
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(&self.default_base_url);
        chat_completions_url(base)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        config: &ReviewConfig,
    ) -> Result<ReviewResult, ReviewError> {
        if config.api_key.trim().is_empty() {
            return Err(ReviewError::Config("API key is required".into()));
        }

        let url = self.endpoint(config);
        let body = ChatRequest {
            model: &config.model,
            temperature: config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
        };

        info!(
            "Requesting review from {} (model {}, {} prompt chars)",
            url,
            config.model,
            prompt.as_str().chars().count()
        );
        let start = Instant::now();
        let timeout_secs = config.api_timeout_secs;

        let response = self
            .http
            .post(&url)
            .bearer_auth(&config.api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout_secs))?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        // Reading the body is still bounded by the request timeout.
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout_secs))?;

        if !status.is_success() {
            let err = classify_status(status, &text, retry_after);
            warn!("Completion failed after {:?}: {}", start.elapsed(), err);
            return Err(err);
        }

        let duration = start.elapsed();
        let result = parse_completion(&text, &config.model, duration)?;
        debug!(
            "Completion: {} chars, usage {:?}, {:?}",
            result.text.len(),
            result.usage,
            duration
        );
        Ok(result)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Join a base URL and the chat-completions path, tolerating a trailing `/`.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn transport_error(e: reqwest::Error, timeout_secs: u64) -> ReviewError {
    if e.is_timeout() {
        ReviewError::Timeout { secs: timeout_secs }
    } else {
        ReviewError::Upstream(format!("request failed: {e}"))
    }
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Map a non-2xx status onto the error taxonomy.
fn classify_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> ReviewError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReviewError::Auth {
            status: status.as_u16(),
            detail: error_detail(body),
        },
        StatusCode::TOO_MANY_REQUESTS => ReviewError::RateLimit {
            retry_after_secs: retry_after,
        },
        _ => ReviewError::Upstream(format!("HTTP {status}: {}", error_detail(body))),
    }
}

/// Prefer the OpenAI-style `{"error": {"message": …}}`, else a clipped body.
fn error_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    let detail = from_json.unwrap_or_else(|| body.trim().replace('\n', " "));
    if detail.is_empty() {
        return "(empty body)".to_string();
    }
    if detail.chars().count() > ERROR_BODY_LIMIT {
        let clipped: String = detail.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{clipped}…")
    } else {
        detail
    }
}

/// Decode a 2xx body into a [`ReviewResult`].
fn parse_completion(
    body: &str,
    requested_model: &str,
    duration: Duration,
) -> Result<ReviewResult, ReviewError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ReviewError::Upstream(format!("malformed completion body: {e}")))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReviewError::Upstream("completion has no choices".into()))?
        .message
        .content
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ReviewError::Upstream("completion content is empty".into()));
    }

    Ok(ReviewResult {
        text,
        model: response
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| requested_model.to_string()),
        created_at: Utc::now(),
        usage: response.usage,
        duration_ms: duration.as_millis() as u64,
    })
}
