use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::features::FeatureRule;
use crate::retry::{RetryConfig, parse_duration};

/// Model and request configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Model identifier sent to the provider
    #[serde(default)]
    pub model: String,
    /// Provider base URL
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Sampling temperature for chat completions
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Default output token limit
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Reasoning effort for reasoning models
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Reasoning summary mode (requires a verified organization)
    #[serde(default)]
    pub reasoning_summary: Option<ReasoningSummary>,
    /// Request encrypted reasoning content on stateless calls
    #[serde(default)]
    pub enable_encrypted_reasoning: bool,
    /// Prompt cache retention window (e.g. "24h")
    #[serde(default)]
    pub prompt_cache_retention: Option<String>,
    /// Stream responses by default
    #[serde(default)]
    pub stream: bool,
    /// Per-call timeout forwarded to the transport (e.g. "60s")
    #[serde(default)]
    pub timeout: Option<String>,
    /// Headers attached by the option selectors when the caller sets none
    #[serde(default)]
    pub extra_headers: Option<IndexMap<String, String>>,
    /// Gateway headers merged into every call
    #[serde(default)]
    pub custom_headers: IndexMap<String, String>,
    /// Opaque body fields passed through to the provider
    #[serde(default)]
    pub extra_body: Option<serde_json::Value>,
    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,
    /// Model capability rules (built-in rules apply when empty)
    #[serde(default)]
    pub features: Vec<FeatureRule>,
}

impl LlmConfig {
    /// Parsed per-call timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration string
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout.as_deref().map(|t| parse_duration("timeout", t)).transpose()
    }
}

/// Reasoning effort level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningEffort {
    /// Reasoning disabled
    None,
    /// Minimal reasoning
    Minimal,
    /// Low effort
    Low,
    /// Medium effort
    Medium,
    /// High effort
    High,
}

impl ReasoningEffort {
    /// Wire name of the effort level
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasoning summary mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningSummary {
    /// Provider decides
    Auto,
    /// Short summary
    Concise,
    /// Full summary
    Detailed,
}

impl ReasoningSummary {
    /// Wire name of the summary mode
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Concise => "concise",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ReasoningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
