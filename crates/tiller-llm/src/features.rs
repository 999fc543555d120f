//! Per-model capability lookup

use tiller_config::{FeatureRule, LlmConfig, default_feature_rules};

/// Capabilities and quirks of a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelFeatures {
    /// Nested tool-call arguments arrive encoded as JSON strings
    pub args_as_json_strings: bool,
    /// The responses API accepts `prompt_cache_retention`
    pub supports_prompt_cache_retention: bool,
}

/// Read-only lookup from model identifier to [`ModelFeatures`]
pub trait FeatureTable: Send + Sync {
    /// Features of `model`
    fn features(&self, model: &str) -> ModelFeatures;
}

impl<F> FeatureTable for F
where
    F: Fn(&str) -> ModelFeatures + Send + Sync,
{
    fn features(&self, model: &str) -> ModelFeatures {
        self(model)
    }
}

/// Feature table driven by substring rules
#[derive(Debug, Clone)]
pub struct PatternFeatureTable {
    rules: Vec<FeatureRule>,
}

impl PatternFeatureTable {
    /// Table with the given rules
    pub const fn new(rules: Vec<FeatureRule>) -> Self {
        Self { rules }
    }

    /// Table from configured rules, or the built-in rules when none are set
    pub fn from_config(config: &LlmConfig) -> Self {
        if config.features.is_empty() {
            Self::default()
        } else {
            Self::new(config.features.clone())
        }
    }
}

impl Default for PatternFeatureTable {
    fn default() -> Self {
        Self::new(default_feature_rules())
    }
}

impl FeatureTable for PatternFeatureTable {
    fn features(&self, model: &str) -> ModelFeatures {
        self.rules
            .iter()
            .filter(|rule| rule.matches(model))
            .fold(ModelFeatures::default(), |acc, rule| ModelFeatures {
                args_as_json_strings: acc.args_as_json_strings || rule.args_as_json_strings,
                supports_prompt_cache_retention: acc.supports_prompt_cache_retention
                    || rule.supports_prompt_cache_retention,
            })
    }
}
