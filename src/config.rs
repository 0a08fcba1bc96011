//! Configuration types for a paper review.
//!
//! Per-request behaviour is controlled through [`ReviewConfig`], built via its
//! [`ReviewConfigBuilder`]. Process-wide fallbacks (API key, base URL, model)
//! live in [`ReviewDefaults`], which is read once at start-up and handed to
//! the builder explicitly rather than consulted as ambient global state.

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default chat model when neither the caller nor `OPENAI_MODEL` names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default reviewer persona injected into the prompt.
pub const DEFAULT_TONE: &str = "mean reviewer who is strict but fair";

/// Configuration for a single review request.
///
/// Built via [`ReviewConfig::builder()`]. `build()` rejects an empty model or
/// API key; an empty domain or language is only rejected when the prompt is
/// rendered, since that is the stage that interpolates them.
///
/// # Example
/// ```rust
/// use choose_paper::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .domain("NLP")
///     .language("zh")
///     .api_key("sk-test")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Clone, PartialEq)]
pub struct ReviewConfig {
    /// Research field tag interpolated into the prompt (e.g. "ML", "CV"). Default: "ML".
    pub domain: String,

    /// Output language tag, interpolated verbatim. `zh*` selects the Chinese
    /// template, anything else the English one. Default: "en".
    pub language: String,

    /// Reviewer persona reminder. Default: [`DEFAULT_TONE`].
    pub tone: String,

    /// Chat model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Bearer token for the completion endpoint. Required.
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API (e.g. DeepSeek, vLLM). When
    /// `None` the client's default endpoint is used.
    pub base_url: Option<String>,

    /// Sampling temperature, clamped to 0.0–2.0. Default: 0.2.
    pub temperature: f32,

    /// Completion call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL sources in seconds. Default: 30.
    pub download_timeout_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            domain: "ML".to_string(),
            language: "en".to_string(),
            tone: DEFAULT_TONE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            base_url: None,
            temperature: 0.2,
            api_timeout_secs: 120,
            download_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("domain", &self.domain)
            .field("language", &self.language)
            .field("tone", &self.tone)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
            model_set: false,
        }
    }

    /// Template language selected by the configured tag.
    pub fn template_language(&self) -> Language {
        Language::from_tag(&self.language)
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
    model_set: bool,
}

impl ReviewConfigBuilder {
    /// Seed unset credentials and model from process-wide defaults.
    ///
    /// Values already set on the builder win; call this before the explicit
    /// setters or after them, the outcome is the same.
    pub fn defaults(mut self, defaults: &ReviewDefaults) -> Self {
        if self.config.api_key.is_empty() {
            if let Some(ref key) = defaults.api_key {
                self.config.api_key = key.clone();
            }
        }
        if self.config.base_url.is_none() {
            self.config.base_url = defaults.base_url.clone();
        }
        if let Some(ref model) = defaults.model {
            if !self.model_set {
                self.config.model = model.clone();
            }
        }
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.config.domain = domain.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.config.tone = tone.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self.model_set = true;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the base URL; blank strings are treated as "not set".
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = if url.trim().is_empty() {
            None
        } else {
            Some(url.trim().to_string())
        };
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ReviewError::Config("model name is required".into()));
        }
        if c.api_key.trim().is_empty() {
            return Err(ReviewError::Config(
                "API key is required (pass --api-key or set OPENAI_API_KEY)".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ReviewError::Config("API timeout must be ≥ 1s".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(ReviewError::Config("download timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

/// Process-wide defaults loaded once at start-up.
///
/// Read-only after construction; every request may override each field.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ReviewDefaults {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl ReviewDefaults {
    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    ///
    /// Empty variables count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build defaults from an arbitrary variable lookup (tests, config files).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL"),
            model: get("OPENAI_MODEL"),
        }
    }
}

impl fmt::Debug for ReviewDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewDefaults")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Prompt template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Chinese template (`zh`, `zh-CN`, `zh_tw`, …).
    Zh,
    /// English template (default).
    #[default]
    En,
}

impl Language {
    /// Map a free-form language tag onto a template.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_lowercase().starts_with("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ReviewConfig::default();
        assert_eq!(c.domain, "ML");
        assert_eq!(c.language, "en");
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.api_timeout_secs, 120);
        assert!(c.base_url.is_none());
    }

    #[test]
    fn build_requires_api_key() {
        let err = ReviewConfig::builder().build().unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn build_requires_model() {
        let err = ReviewConfig::builder()
            .api_key("sk-test")
            .model("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ReviewConfig::builder()
            .api_key("k")
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn blank_base_url_is_unset() {
        let c = ReviewConfig::builder()
            .api_key("k")
            .base_url("   ")
            .build()
            .unwrap();
        assert!(c.base_url.is_none());
    }

    #[test]
    fn explicit_values_beat_defaults() {
        let defaults = ReviewDefaults {
            api_key: Some("env-key".into()),
            base_url: Some("https://env.example/v1".into()),
            model: Some("env-model".into()),
        };
        let c = ReviewConfig::builder()
            .api_key("flag-key")
            .model("flag-model")
            .defaults(&defaults)
            .build()
            .unwrap();
        assert_eq!(c.api_key, "flag-key");
        assert_eq!(c.model, "flag-model");
        assert_eq!(c.base_url.as_deref(), Some("https://env.example/v1"));
    }

    #[test]
    fn defaults_fill_missing_values() {
        let defaults = ReviewDefaults::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("env-key".into()),
            "OPENAI_MODEL" => Some("deepseek-chat".into()),
            "OPENAI_BASE_URL" => Some("".into()),
            _ => None,
        });
        assert!(defaults.base_url.is_none());
        let c = ReviewConfig::builder().defaults(&defaults).build().unwrap();
        assert_eq!(c.api_key, "env-key");
        assert_eq!(c.model, "deepseek-chat");
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ReviewConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));

        let d = ReviewDefaults {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{d:?}").contains("sk-secret"));
    }

    #[test]
    fn language_from_tag() {
        assert_eq!(Language::from_tag("zh"), Language::Zh);
        assert_eq!(Language::from_tag("ZH-cn"), Language::Zh);
        assert_eq!(Language::from_tag("en"), Language::En);
        assert_eq!(Language::from_tag("fr"), Language::En);
    }
}
