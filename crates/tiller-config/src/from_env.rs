use indexmap::IndexMap;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use url::Url;

use crate::LlmConfig;

/// Prefix used by [`LlmConfig::from_env`]
pub const ENV_PREFIX: &str = "LLM_";

impl LlmConfig {
    /// Build an LLM configuration from `LLM_*` environment variables
    ///
    /// `LLM_MODEL` is required. Header maps are read as JSON objects.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Build an LLM configuration from environment variables with a custom prefix
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result is invalid
    pub fn from_env_with_prefix(prefix: &str) -> anyhow::Result<Self> {
        let var = |name: &str| std::env::var(format!("{prefix}{name}")).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self {
            model: var("MODEL").ok_or_else(|| anyhow::anyhow!("{prefix}MODEL must be set"))?,
            ..Self::default()
        };

        if let Some(key) = var("API_KEY") {
            config.api_key = Some(SecretString::from(key));
        }

        if let Some(url) = var("BASE_URL") {
            config.base_url =
                Some(Url::parse(&url).map_err(|e| anyhow::anyhow!("invalid {prefix}BASE_URL '{url}': {e}"))?);
        }

        config.temperature = parse_number(prefix, "TEMPERATURE", var("TEMPERATURE"))?;
        config.top_p = parse_number(prefix, "TOP_P", var("TOP_P"))?;
        config.max_output_tokens = parse_number(prefix, "MAX_OUTPUT_TOKENS", var("MAX_OUTPUT_TOKENS"))?;

        if let Some(attempts) = parse_number(prefix, "NUM_RETRIES", var("NUM_RETRIES"))? {
            config.retry.max_attempts = attempts;
        }

        if let Some(stream) = var("STREAM") {
            config.stream = parse_bool(&stream).ok_or_else(|| anyhow::anyhow!("invalid {prefix}STREAM '{stream}'"))?;
        }

        if let Some(enabled) = var("ENABLE_ENCRYPTED_REASONING") {
            config.enable_encrypted_reasoning = parse_bool(&enabled)
                .ok_or_else(|| anyhow::anyhow!("invalid {prefix}ENABLE_ENCRYPTED_REASONING '{enabled}'"))?;
        }

        config.reasoning_effort = parse_named(prefix, "REASONING_EFFORT", var("REASONING_EFFORT"))?;
        config.reasoning_summary = parse_named(prefix, "REASONING_SUMMARY", var("REASONING_SUMMARY"))?;
        config.prompt_cache_retention = var("PROMPT_CACHE_RETENTION");
        config.timeout = var("TIMEOUT");

        if let Some(raw) = var("EXTRA_HEADERS") {
            config.extra_headers = Some(parse_headers(prefix, "EXTRA_HEADERS", &raw)?);
        }

        if let Some(raw) = var("CUSTOM_HEADERS") {
            config.custom_headers = parse_headers(prefix, "CUSTOM_HEADERS", &raw)?;
        }

        config.validate()?;

        Ok(config)
    }
}

/// Parse a boolean flag the way shell users write them
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<T>(prefix: &str, name: &str, value: Option<String>) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {prefix}{name} '{v}': {e}"))
        })
        .transpose()
}

fn parse_named<T: DeserializeOwned>(prefix: &str, name: &str, value: Option<String>) -> anyhow::Result<Option<T>> {
    value
        .map(|v| {
            serde_json::from_value(serde_json::Value::String(v.trim().to_ascii_lowercase()))
                .map_err(|e| anyhow::anyhow!("invalid {prefix}{name} '{v}': {e}"))
        })
        .transpose()
}

fn parse_headers(prefix: &str, name: &str, raw: &str) -> anyhow::Result<IndexMap<String, String>> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("{prefix}{name} must be a JSON object of strings: {e}"))
}
