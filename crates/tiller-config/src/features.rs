use serde::Deserialize;

/// Per-model capability rule
///
/// A rule applies to every model whose identifier contains `pattern`,
/// compared case-insensitively. When several rules match, their flags
/// are combined.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRule {
    /// Substring matched against the model identifier
    pub pattern: String,
    /// Model returns nested tool-call arguments encoded as JSON strings
    #[serde(default)]
    pub args_as_json_strings: bool,
    /// Model accepts the `prompt_cache_retention` option
    #[serde(default)]
    pub supports_prompt_cache_retention: bool,
}

impl FeatureRule {
    /// Check whether this rule applies to `model`
    pub fn matches(&self, model: &str) -> bool {
        model.to_ascii_lowercase().contains(&self.pattern.to_ascii_lowercase())
    }
}

/// Built-in rules used when the configuration lists none
pub fn default_feature_rules() -> Vec<FeatureRule> {
    vec![
        FeatureRule {
            pattern: "glm".to_owned(),
            args_as_json_strings: true,
            supports_prompt_cache_retention: false,
        },
        FeatureRule {
            pattern: "gpt-5".to_owned(),
            args_as_json_strings: false,
            supports_prompt_cache_retention: true,
        },
        FeatureRule {
            pattern: "gpt-4.1".to_owned(),
            args_as_json_strings: false,
            supports_prompt_cache_retention: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matches_case_insensitively() {
        let rule = FeatureRule {
            pattern: "GLM".to_owned(),
            args_as_json_strings: true,
            supports_prompt_cache_retention: false,
        };

        assert!(rule.matches("litellm_proxy/openrouter/z-ai/glm-4.6"));
        assert!(!rule.matches("gpt-4"));
    }

    #[test]
    fn builtin_rules_cover_glm_and_gpt5() {
        let rules = default_feature_rules();

        assert!(rules.iter().any(|r| r.matches("z-ai/glm-4.6") && r.args_as_json_strings));
        assert!(rules.iter().any(|r| r.matches("openai/gpt-5-mini") && r.supports_prompt_cache_retention));
        assert!(!rules.iter().any(|r| r.matches("gpt-4o")));
    }
}
