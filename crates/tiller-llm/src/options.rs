//! Per-call option selection for both transports
//!
//! Options are resolved once per call from the configuration, the caller's
//! overrides and the model features. The retry loop owns the result.

use serde_json::{Map, Value, json};
use tiller_config::LlmConfig;
use url::Url;

use crate::features::ModelFeatures;
use crate::kwargs::CallKwargs;
use crate::protocol::responses::ENCRYPTED_REASONING_INCLUDE;

/// Options the subscription Codex backend rejects
const CODEX_UNSUPPORTED: [&str; 6] = [
    "max_output_tokens",
    "temperature",
    "tool_choice",
    "reasoning",
    "include",
    "prompt_cache_retention",
];

/// Whether `base_url` points at the ChatGPT subscription Codex backend
pub fn is_subscription_codex_transport(base_url: Option<&Url>) -> bool {
    let Some(url) = base_url else {
        return false;
    };
    let base = url.as_str().to_ascii_lowercase();
    base.contains("chatgpt.com") && base.contains("backend-api") && base.contains("codex")
}

/// Resolve the kwargs for a responses-API call
///
/// `include` and `store` are per-call overrides; `None` means unset.
pub fn select_responses_options(
    config: &LlmConfig,
    features: ModelFeatures,
    user_kwargs: CallKwargs,
    include: Option<&[String]>,
    store: Option<bool>,
) -> CallKwargs {
    let mut out = user_kwargs;

    if let Some(max) = config.max_output_tokens {
        out.insert_if_absent("max_output_tokens", max);
    }

    if is_subscription_codex_transport(config.base_url.as_ref()) {
        for key in CODEX_UNSUPPORTED {
            out.remove(key);
        }
        out.insert("store", false);
        out.insert("stream", true);
        attach_config_headers(config, &mut out);
        attach_extra_body(config, &mut out);
        return out;
    }

    out.insert("temperature", 1.0);
    out.insert("tool_choice", "auto");

    attach_config_headers(config, &mut out);

    match store {
        Some(store) => {
            out.insert("store", store);
        }
        None => out.insert_if_absent("store", false),
    }

    let mut include_list: Vec<String> = include.map(<[String]>::to_vec).unwrap_or_default();
    if !out.is_truthy("store")
        && config.enable_encrypted_reasoning
        && !include_list.iter().any(|item| item == ENCRYPTED_REASONING_INCLUDE)
    {
        include_list.push(ENCRYPTED_REASONING_INCLUDE.to_owned());
    }
    if !include_list.is_empty() {
        out.insert("include", include_list);
    }

    if let Some(effort) = config.reasoning_effort {
        let mut reasoning = Map::new();
        reasoning.insert("effort".to_owned(), json!(effort.as_str()));
        if let Some(summary) = config.reasoning_summary {
            reasoning.insert("summary".to_owned(), json!(summary.as_str()));
        }
        out.insert("reasoning", reasoning);
    }

    if features.supports_prompt_cache_retention
        && let Some(retention) = config.prompt_cache_retention.as_deref().filter(|r| !r.is_empty())
    {
        out.insert("prompt_cache_retention", retention);
    }

    attach_extra_body(config, &mut out);

    out
}

/// Resolve the kwargs for a chat-completions call
///
/// Sampling defaults from the configuration fill gaps only; caller values
/// always win.
pub fn select_chat_options(config: &LlmConfig, user_kwargs: CallKwargs) -> CallKwargs {
    let mut out = user_kwargs;

    if let Some(temperature) = config.temperature {
        out.insert_if_absent("temperature", temperature);
    }
    if let Some(top_p) = config.top_p {
        out.insert_if_absent("top_p", top_p);
    }
    if let Some(max) = config.max_output_tokens {
        out.insert_if_absent("max_completion_tokens", max);
    }
    if let Some(effort) = config.reasoning_effort {
        out.insert_if_absent("reasoning_effort", effort.as_str());
    }

    attach_config_headers(config, &mut out);
    attach_extra_body(config, &mut out);

    out
}

fn attach_config_headers(config: &LlmConfig, out: &mut CallKwargs) {
    if let Some(headers) = &config.extra_headers
        && !out.contains_key("extra_headers")
    {
        let headers: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        out.insert("extra_headers", headers);
    }
}

fn attach_extra_body(config: &LlmConfig, out: &mut CallKwargs) {
    if let Some(body) = config.extra_body.as_ref().filter(|body| is_truthy(body)) {
        out.insert("extra_body", body.clone());
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
