use std::path::Path;

use http::{HeaderName, HeaderValue};
use indexmap::IndexMap;

use crate::{Config, LlmConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `${VAR}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), model = %config.llm.model, "loaded configuration");

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if any section is invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.validate()?;

        validate_log_filter(&self.logging.filter)?;

        Ok(())
    }
}

impl LlmConfig {
    /// Validate model, sampling, retry and header settings
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            anyhow::bail!("llm.temperature must be between 0 and 2, got {temperature}");
        }

        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            anyhow::bail!("llm.top_p must be between 0 and 1, got {top_p}");
        }

        self.timeout()?;
        self.validate_retry()?;

        if let Some(ref headers) = self.extra_headers {
            validate_headers("llm.extra_headers", headers)?;
        }
        validate_headers("llm.custom_headers", &self.custom_headers)?;

        for rule in &self.features {
            if rule.pattern.trim().is_empty() {
                anyhow::bail!("llm.features pattern must not be empty");
            }
        }

        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        self.retry
            .backoff_bounds()
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("llm.retry: {e}"))
    }
}

/// Ensure header names and values are valid HTTP
fn validate_headers(section: &str, headers: &IndexMap<String, String>) -> anyhow::Result<()> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid header name '{name}' in {section}: {e}"))?;
        HeaderValue::from_str(value).map_err(|e| anyhow::anyhow!("invalid value for header '{name}' in {section}: {e}"))?;
    }

    Ok(())
}

fn validate_log_filter(filter: &str) -> anyhow::Result<()> {
    if filter.trim().is_empty() {
        anyhow::bail!("logging.filter must not be empty");
    }

    Ok(())
}
