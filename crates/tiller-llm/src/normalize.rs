//! Tool-call argument repair for models that string-encode nested JSON
//!
//! Some models return arguments such as `{"view_range": "[1, 100]"}` where
//! the list arrives as a JSON string. For models flagged with
//! `args_as_json_strings`, every string that parses as JSON is replaced by
//! its parsed value, recursively, and the tree is written back compactly.
//! Number and literal tokens are copied as raw text, so integers of any
//! size survive unchanged.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::value::RawValue;

use crate::features::FeatureTable;
use crate::protocol::chat::ChatCompletionResponse;
use crate::protocol::responses::{OutputItem, ResponsesResponse};

/// Repairs tool-call arguments according to per-model features
#[derive(Clone)]
pub struct ArgumentNormalizer {
    features: Arc<dyn FeatureTable>,
}

impl ArgumentNormalizer {
    /// Normalizer consulting `features`
    pub fn new(features: Arc<dyn FeatureTable>) -> Self {
        Self { features }
    }

    /// Normalize one arguments string for `model`
    ///
    /// Returns the input unchanged when the model is not flagged or the
    /// input is not valid JSON.
    pub fn normalize_arguments(&self, model: &str, raw: &str) -> String {
        if !self.features.features(model).args_as_json_strings {
            return raw.to_owned();
        }
        normalize_json_string(raw).unwrap_or_else(|| raw.to_owned())
    }

    /// Normalize every tool call of every choice
    pub fn normalize_chat_completion(&self, model: &str, mut response: ChatCompletionResponse) -> ChatCompletionResponse {
        if !self.features.features(model).args_as_json_strings {
            return response;
        }

        let calls = response
            .choices
            .iter_mut()
            .filter_map(|choice| choice.message.tool_calls.as_mut())
            .flatten();

        for call in calls {
            repair_in_place(&mut call.function.arguments);
        }

        response
    }

    /// Normalize the arguments of every `function_call` output item
    pub fn normalize_responses(&self, model: &str, mut response: ResponsesResponse) -> ResponsesResponse {
        if !self.features.features(model).args_as_json_strings {
            return response;
        }

        for item in &mut response.output {
            if let OutputItem::FunctionCall { arguments, .. } = item {
                repair_in_place(arguments);
            }
        }

        response
    }
}

impl std::fmt::Debug for ArgumentNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentNormalizer").finish_non_exhaustive()
    }
}

fn repair_in_place(arguments: &mut String) {
    if arguments.is_empty() {
        return;
    }
    if let Some(fixed) = normalize_json_string(arguments) {
        *arguments = fixed;
    }
}

fn normalize_json_string(raw: &str) -> Option<String> {
    let parsed: &RawValue = serde_json::from_str(raw).ok()?;
    normalize_node(parsed.get()).ok()
}

/// Rewrite one JSON document, replacing strings that hold valid JSON with
/// their parsed value
///
/// Scalars are not special-cased: `"42"` becomes `42`.
fn normalize_node(text: &str) -> serde_json::Result<String> {
    let text = text.trim();

    match text.as_bytes().first() {
        Some(b'{') => {
            let fields: IndexMap<String, Box<RawValue>> = serde_json::from_str(text)?;
            let fields = fields
                .iter()
                .map(|(key, value)| Ok(format!("{}:{}", serde_json::to_string(key)?, normalize_node(value.get())?)))
                .collect::<serde_json::Result<Vec<_>>>()?;
            Ok(format!("{{{}}}", fields.join(",")))
        }
        Some(b'[') => {
            let items: Vec<Box<RawValue>> = serde_json::from_str(text)?;
            let items = items
                .iter()
                .map(|item| normalize_node(item.get()))
                .collect::<serde_json::Result<Vec<_>>>()?;
            Ok(format!("[{}]", items.join(",")))
        }
        Some(b'"') => {
            let decoded: String = serde_json::from_str(text)?;
            match serde_json::from_str::<&RawValue>(&decoded) {
                Ok(inner) => normalize_node(inner.get()),
                Err(_) => Ok(text.to_owned()),
            }
        }
        _ => Ok(text.to_owned()),
    }
}
