use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Expand `${VAR}` and `${VAR:-default}` placeholders in raw TOML text
///
/// An unset variable without a default is an error. Lines starting with `#`
/// are TOML comments and are left alone, so commented-out settings may
/// reference variables that do not exist.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("must be valid regex"))
    }

    let mut lines = Vec::new();

    for line in input.split('\n') {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
            continue;
        }

        let mut missing = None;
        let expanded = re().replace_all(line, |caps: &Captures<'_>| {
            let name = &caps[1];
            match (std::env::var(name), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_owned(),
                (Err(_), None) => {
                    missing.get_or_insert_with(|| name.to_owned());
                    String::new()
                }
            }
        });

        if let Some(name) = missing {
            return Err(format!("environment variable not found: `{name}`"));
        }

        lines.push(expanded.into_owned());
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "model = \"gpt-5\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn set_variable_is_substituted() {
        temp_env::with_var("TILLER_TEST_KEY", Some("sk-123"), || {
            let result = expand_env("api_key = \"${TILLER_TEST_KEY}\"").unwrap();
            assert_eq!(result, "api_key = \"sk-123\"");
        });
    }

    #[test]
    fn several_variables_on_several_lines() {
        let vars = [("TILLER_A", Some("a")), ("TILLER_B", Some("b"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("x = \"${TILLER_A}-${TILLER_B}\"\ny = \"${TILLER_B}\"").unwrap();
            assert_eq!(result, "x = \"a-b\"\ny = \"b\"");
        });
    }

    #[test]
    fn unset_variable_is_an_error() {
        temp_env::with_var_unset("TILLER_MISSING", || {
            let err = expand_env("api_key = \"${TILLER_MISSING}\"").unwrap_err();
            assert!(err.contains("TILLER_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("TILLER_URL", || {
            let result = expand_env("base_url = \"${TILLER_URL:-https://api.openai.com/v1}\"").unwrap();
            assert_eq!(result, "base_url = \"https://api.openai.com/v1\"");
        });

        temp_env::with_var("TILLER_URL", Some("http://localhost:4000"), || {
            let result = expand_env("base_url = \"${TILLER_URL:-https://api.openai.com/v1}\"").unwrap();
            assert_eq!(result, "base_url = \"http://localhost:4000\"");
        });
    }

    #[test]
    fn empty_default_is_allowed() {
        temp_env::with_var_unset("TILLER_EMPTY", || {
            assert_eq!(expand_env("k = \"${TILLER_EMPTY:-}\"").unwrap(), "k = \"\"");
        });
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("TILLER_MISSING", || {
            let input = "  # api_key = \"${TILLER_MISSING}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn dollar_without_braces_is_literal() {
        assert_eq!(expand_env("price = \"$5\"").unwrap(), "price = \"$5\"");
    }
}
