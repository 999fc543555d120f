#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use args::{Args, Command, Shape};
use clap::Parser;
use serde_json::{Value, json};
use tiller_config::{Config, LlmConfig};
use tiller_llm::convert::chat::assemble_chat;
use tiller_llm::convert::responses::assemble_responses;
use tiller_llm::options::{is_subscription_codex_transport, select_responses_options};
use tiller_llm::protocol::chat::ChatCompletionResponse;
use tiller_llm::protocol::responses::ResponsesResponse;
use tiller_llm::{ArgumentNormalizer, CallKwargs, FeatureTable, Gateway, PatternFeatureTable, RetryPolicy};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    tiller_telemetry::init(Some(&config.logging), "info")?;

    tracing::debug!(config_path = %args.config.display(), "starting tiller");

    let output = match args.command {
        Command::Check => check(&config.llm)?,
        Command::Options { include, store } => responses_options(&config.llm, include, store)?,
        Command::Normalize { shape, file } => normalize(&config.llm, shape, file.as_deref())?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Resolved model settings
fn check(llm: &LlmConfig) -> anyhow::Result<Value> {
    let policy = RetryPolicy::from_config(&llm.retry)?;
    let features = PatternFeatureTable::from_config(llm).features(&llm.model);

    Ok(json!({
        "model": llm.model,
        "base_url": llm.base_url.as_ref().map(url::Url::as_str),
        "subscription_codex_transport": is_subscription_codex_transport(llm.base_url.as_ref()),
        "stream": llm.stream,
        "features": {
            "args_as_json_strings": features.args_as_json_strings,
            "supports_prompt_cache_retention": features.supports_prompt_cache_retention,
        },
        "retry": {
            "max_attempts": policy.attempts(),
            "min_wait_secs": policy.min_wait.as_secs_f64(),
            "max_wait_secs": policy.max_wait.as_secs_f64(),
            "multiplier": policy.multiplier,
            "retry_on": policy.retry_on.iter().map(|class| format!("{class:?}")).collect::<Vec<_>>(),
        },
    }))
}

/// Kwargs for a responses-API call without per-call overrides
fn responses_options(llm: &LlmConfig, include: Vec<String>, store: Option<bool>) -> anyhow::Result<Value> {
    let features = PatternFeatureTable::from_config(llm).features(&llm.model);
    let include = (!include.is_empty()).then_some(include);

    let kwargs = select_responses_options(llm, features, CallKwargs::new(), include.as_deref(), store);
    let kwargs = Gateway::new(&llm.custom_headers).prepare_request_kwargs(kwargs);

    Ok(serde_json::to_value(kwargs)?)
}

/// Normalize and assemble a raw provider response
fn normalize(llm: &LlmConfig, shape: Shape, file: Option<&Path>) -> anyhow::Result<Value> {
    let raw = read_input(file)?;
    let normalizer = ArgumentNormalizer::new(Arc::new(PatternFeatureTable::from_config(llm)));

    let response = match shape {
        Shape::Chat => {
            let response: ChatCompletionResponse =
                serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("invalid chat completion response: {e}"))?;
            assemble_chat(normalizer.normalize_chat_completion(&llm.model, response))?
        }
        Shape::Responses => {
            let response: ResponsesResponse =
                serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("invalid responses response: {e}"))?;
            assemble_responses(normalizer.normalize_responses(&llm.model, response))?
        }
    };

    Ok(serde_json::to_value(response)?)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}
