use indexmap::IndexMap;
use serde_json::{Map, Value};
use tiller_core::{is_sensitive_header, merge_headers};

use crate::kwargs::CallKwargs;

const EXTRA_HEADERS: &str = "extra_headers";
const REDACTED: &str = "<redacted>";

/// Static headers attached to every outbound call
///
/// Used for enterprise gateways that require fixed routing or tenant headers
/// on top of whatever the caller sends.
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    custom_headers: IndexMap<String, Value>,
}

impl Gateway {
    /// Gateway attaching `custom_headers`
    pub fn new(custom_headers: &IndexMap<String, String>) -> Self {
        Self {
            custom_headers: custom_headers
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
        }
    }

    /// Whether any headers are configured
    pub fn is_empty(&self) -> bool {
        self.custom_headers.is_empty()
    }

    /// Merge the gateway headers into `kwargs["extra_headers"]`
    ///
    /// An absent or non-object `extra_headers` counts as empty. Gateway values
    /// win on case-insensitive collisions, each of which is logged. The merged
    /// headers are attached only when non-empty.
    pub fn prepare_request_kwargs(&self, mut kwargs: CallKwargs) -> CallKwargs {
        if self.custom_headers.is_empty() {
            return kwargs;
        }

        let existing: IndexMap<String, Value> = match kwargs.remove(EXTRA_HEADERS) {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(Value::Null) | None => IndexMap::new(),
            Some(other) => {
                tracing::debug!(value = %other, "ignoring non-object extra_headers");
                IndexMap::new()
            }
        };

        let merged = merge_headers(&existing, &self.custom_headers);

        for collision in &merged.collisions {
            let (old, new) = if is_sensitive_header(&collision.name) {
                (REDACTED.to_owned(), REDACTED.to_owned())
            } else {
                (display_value(&collision.old), display_value(&collision.new))
            };
            tracing::warn!(header = %collision.name, old = %old, new = %new, "gateway header overrides request header");
        }

        if !merged.headers.is_empty() {
            let headers: Map<String, Value> = merged.headers.into_iter().collect();
            kwargs.insert(EXTRA_HEADERS, headers);
        }

        kwargs
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
