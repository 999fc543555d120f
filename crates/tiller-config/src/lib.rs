#![allow(clippy::must_use_candidate)]

mod env;
pub mod features;
mod from_env;
pub mod llm;
mod loader;
pub mod logging;
pub mod retry;

use serde::Deserialize;

pub use features::*;
pub use from_env::{ENV_PREFIX, parse_bool};
pub use llm::*;
pub use logging::*;
pub use retry::*;

/// Top-level Tiller configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model and request configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}
