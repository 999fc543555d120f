use std::time::Duration;

use serde::Deserialize;

/// Retry behavior for completion calls
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first one (0 behaves like 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Lower bound for the wait between attempts (e.g. "8s")
    #[serde(default = "default_min_wait")]
    pub min_wait: String,
    /// Upper bound for the wait between attempts (e.g. "64s")
    #[serde(default = "default_max_wait")]
    pub max_wait: String,
    /// Exponential backoff multiplier, in seconds
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Error classes that trigger another attempt
    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<RetryOn>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_wait: default_min_wait(),
            max_wait: default_max_wait(),
            multiplier: default_multiplier(),
            retry_on: default_retry_on(),
        }
    }
}

impl RetryConfig {
    /// Parsed lower wait bound
    ///
    /// # Errors
    ///
    /// Returns an error if `min_wait` is not a valid duration string
    pub fn min_wait(&self) -> anyhow::Result<Duration> {
        parse_duration("min_wait", &self.min_wait)
    }

    /// Parsed upper wait bound
    ///
    /// # Errors
    ///
    /// Returns an error if `max_wait` is not a valid duration string
    pub fn max_wait(&self) -> anyhow::Result<Duration> {
        parse_duration("max_wait", &self.max_wait)
    }

    /// Parsed `(min_wait, max_wait)` after checking them against each other
    /// and the multiplier
    ///
    /// # Errors
    ///
    /// Returns an error if a wait is unparsable, `min_wait` exceeds
    /// `max_wait`, or the multiplier is below 1.0 or not finite
    pub fn backoff_bounds(&self) -> anyhow::Result<(Duration, Duration)> {
        let min_wait = self.min_wait()?;
        let max_wait = self.max_wait()?;

        if min_wait > max_wait {
            anyhow::bail!("min_wait ({}) must not exceed max_wait ({})", self.min_wait, self.max_wait);
        }

        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            anyhow::bail!("multiplier must be at least 1.0, got {}", self.multiplier);
        }

        Ok((min_wait, max_wait))
    }
}

/// Error class that may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Provider answered without usable choices
    NoResponse,
    /// Connection could not be established or timed out
    Connection,
    /// Provider reported a transient server-side failure
    ServiceUnavailable,
}

pub(crate) fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}

const fn default_max_attempts() -> u32 {
    5
}

fn default_min_wait() -> String {
    "8s".to_owned()
}

fn default_max_wait() -> String {
    "64s".to_owned()
}

const fn default_multiplier() -> f64 {
    2.0
}

fn default_retry_on() -> Vec<RetryOn> {
    vec![RetryOn::NoResponse, RetryOn::Connection, RetryOn::ServiceUnavailable]
}
