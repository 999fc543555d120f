//! Bounded exponential-backoff retry around a single logical call
//!
//! Each attempt runs the raw transport call. Internal-server errors that look
//! like the "choices missing" failure family are reclassified as
//! [`LlmError::NoResponse`] before the retry decision. Between attempts the
//! controller logs, notifies the optional listener and bumps a zero
//! temperature to `1.0`, since some providers return empty choices
//! deterministically at temperature 0.

use std::collections::BTreeSet;
use std::fmt;
use std::num::FpCategory;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tiller_config::{RetryConfig, RetryOn};

use crate::error::{LlmError, TransportError, TransportErrorKind};
use crate::kwargs::CallKwargs;

/// Retry classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorClass {
    /// Provider answered without usable choices
    NoResponse,
    /// Network-level failure or timeout
    Connection,
    /// Provider unavailable or rate limited
    ServiceUnavailable,
    /// Never retried
    Fatal,
}

impl From<RetryOn> for ErrorClass {
    fn from(value: RetryOn) -> Self {
        match value {
            RetryOn::NoResponse => Self::NoResponse,
            RetryOn::Connection => Self::Connection,
            RetryOn::ServiceUnavailable => Self::ServiceUnavailable,
        }
    }
}

/// Whether `message` belongs to the "choices missing or invalid" family
///
/// Matches when the lower-cased message contains `choices` and at least one
/// of `none`, `assert` or `invalid`.
pub fn looks_like_choices_none_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("choices") && ["none", "assert", "invalid"].iter().any(|needle| lower.contains(needle))
}

/// Retry class of `error`, looking through exhaustion metadata
pub fn classify(error: &LlmError) -> ErrorClass {
    match error.root() {
        LlmError::NoResponse { .. } => ErrorClass::NoResponse,
        LlmError::Transport(e) => match e.kind {
            TransportErrorKind::Connection | TransportErrorKind::Timeout => ErrorClass::Connection,
            TransportErrorKind::ServiceUnavailable | TransportErrorKind::RateLimited => ErrorClass::ServiceUnavailable,
            TransportErrorKind::InternalServer if looks_like_choices_none_error(&e.message) => ErrorClass::NoResponse,
            TransportErrorKind::InternalServer
            | TransportErrorKind::BadRequest
            | TransportErrorKind::Authentication
            | TransportErrorKind::Other => ErrorClass::Fatal,
        },
        LlmError::Configuration(_) | LlmError::InvalidResponse(_) | LlmError::RetriesExhausted { .. } => {
            ErrorClass::Fatal
        }
    }
}

impl LlmError {
    /// Retry class of this error
    pub fn class(&self) -> ErrorClass {
        classify(self)
    }
}

fn is_malformed_internal(error: &TransportError) -> bool {
    error.kind == TransportErrorKind::InternalServer && looks_like_choices_none_error(&error.message)
}

/// Turn a matching internal-server error into a no-response error
fn reclassify(error: LlmError) -> LlmError {
    match error {
        LlmError::Transport(e) if is_malformed_internal(&e) => LlmError::NoResponse {
            message: format!("provider returned malformed response: {e}"),
            source: Some(e),
        },
        other => other,
    }
}

fn is_no_response_failure(error: &LlmError) -> bool {
    match error.root() {
        LlmError::NoResponse { .. } => true,
        LlmError::Transport(e) => is_malformed_internal(e),
        _ => false,
    }
}

/// Retry policy bound to a call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (0 behaves like 1)
    pub max_attempts: u32,
    /// Lower bound for the wait between attempts
    pub min_wait: Duration,
    /// Upper bound for the wait between attempts
    pub max_wait: Duration,
    /// Exponential backoff multiplier, in seconds
    pub multiplier: f64,
    /// Classes that trigger another attempt
    pub retry_on: BTreeSet<ErrorClass>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_wait: Duration::from_secs(8),
            max_wait: Duration::from_secs(64),
            multiplier: 2.0,
            retry_on: BTreeSet::from([ErrorClass::NoResponse]),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from configuration
    pub fn from_config(config: &RetryConfig) -> Result<Self, LlmError> {
        let (min_wait, max_wait) = config
            .backoff_bounds()
            .map_err(|e| LlmError::Configuration(format!("retry: {e}")))?;

        Ok(Self {
            max_attempts: config.max_attempts,
            min_wait,
            max_wait,
            multiplier: config.multiplier,
            retry_on: config.retry_on.iter().copied().map(ErrorClass::from).collect(),
        })
    }

    /// Policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Attempts the controller will make
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `error` may be retried under this policy
    pub fn is_retryable(&self, error: &LlmError) -> bool {
        self.retry_on.contains(&error.class())
    }

    /// Wait after failed attempt `attempt` (1-based)
    ///
    /// `multiplier * 2^(attempt - 1)` seconds clamped to `[min_wait, max_wait]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.multiplier * 2f64.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
            .max(self.min_wait)
    }
}

/// Callback invoked before each retry with `(attempt, max_attempts)`
pub type RetryListener = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Blocks the calling thread between attempts
pub trait Sleeper: Send + Sync {
    /// Sleep for `duration`
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Runs a call under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    listener: Option<RetryListener>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryController {
    /// Controller for `policy`, sleeping on the current thread
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            listener: None,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the bound policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Notify `listener` before every retry
    #[must_use]
    pub fn with_listener(mut self, listener: RetryListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the sleeper used between attempts
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Bound policy
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget runs out
    ///
    /// `kwargs` belong to the in-flight call; the controller may adjust them
    /// between attempts and every attempt sees the current values. When
    /// retries were allowed and all of them failed, the last error is wrapped
    /// in [`LlmError::RetriesExhausted`].
    pub fn run<T, F>(&self, kwargs: &mut CallKwargs, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut(&CallKwargs) -> Result<T, LlmError>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            let error = match call(kwargs) {
                Ok(value) => return Ok(value),
                Err(e) => reclassify(e),
            };

            if !self.policy.is_retryable(&error) {
                return Err(error);
            }

            if attempt >= max_attempts {
                if max_attempts == 1 {
                    return Err(error);
                }
                tracing::error!(attempts = attempt, max_attempts, error = %error, "retries exhausted");
                return Err(LlmError::RetriesExhausted {
                    attempts: attempt,
                    max_attempts,
                    source: Box::new(error),
                });
            }

            self.before_sleep(attempt, max_attempts, &error, kwargs);
            self.sleeper.sleep(self.policy.backoff(attempt));
            attempt += 1;
        }
    }

    fn before_sleep(&self, attempt: u32, max_attempts: u32, error: &LlmError, kwargs: &mut CallKwargs) {
        tracing::warn!(attempt, max_attempts, error = %error, "completion attempt failed, retrying");

        if let Some(listener) = &self.listener {
            listener(attempt, max_attempts);
        }

        if is_no_response_failure(error) {
            bump_zero_temperature(kwargs);
        }
    }
}

impl fmt::Debug for RetryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryController")
            .field("policy", &self.policy)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

fn bump_zero_temperature(kwargs: &mut CallKwargs) {
    let Some(temperature) = kwargs.get("temperature").and_then(Value::as_f64) else {
        return;
    };

    if temperature.classify() == FpCategory::Zero {
        tracing::warn!("empty choices at temperature 0, retrying with temperature 1.0");
        kwargs.insert("temperature", 1.0);
    } else {
        tracing::warn!(temperature, "empty choices at non-zero temperature, keeping it");
    }
}
