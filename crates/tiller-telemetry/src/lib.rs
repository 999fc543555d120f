//! Logging setup for Tiller
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! formatting layer writing to stderr, so stdout stays free for command output.

use tiller_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build the log filter from configuration
///
/// The configured directive wins over `default_filter`.
///
/// # Errors
///
/// Returns an error if the directive cannot be parsed
pub fn build_filter(config: Option<&LoggingConfig>, default_filter: &str) -> anyhow::Result<EnvFilter> {
    let directive = config.map_or(default_filter, |c| c.filter.as_str());

    EnvFilter::try_new(directive).map_err(|e| anyhow::anyhow!("invalid log filter '{directive}': {e}"))
}

/// Initialize logging from configuration
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed
pub fn init(config: Option<&LoggingConfig>, default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(config, default_filter)?;
    let format = config.map_or(LogFormat::Text, |c| c.format);

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
