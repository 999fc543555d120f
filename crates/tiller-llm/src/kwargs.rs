//! Keyword arguments for a single provider call

use std::num::FpCategory;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered option bundle passed to the transport
///
/// Built once per call by the option selectors and the gateway, then owned by
/// the retry loop, which may adjust it between attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallKwargs(Map<String, Value>);

impl CallKwargs {
    /// Empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is set
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set `key`, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Set `key` only when it is absent
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Remove `key`, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Whether `key` is set to a truthy value
    ///
    /// `null`, `false`, zero, and empty strings, arrays, and objects are falsy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|value| match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f.classify() != FpCategory::Zero),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Underlying JSON object
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for CallKwargs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for CallKwargs {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_if_absent_keeps_caller_value() {
        let mut kwargs: CallKwargs = [("max_output_tokens", json!(100))].into_iter().collect();

        kwargs.insert_if_absent("max_output_tokens", 4096);
        kwargs.insert_if_absent("temperature", 0.5);

        assert_eq!(kwargs.get("max_output_tokens"), Some(&json!(100)));
        assert_eq!(kwargs.get("temperature"), Some(&json!(0.5)));
    }

    #[test]
    fn remove_preserves_order() {
        let mut kwargs: CallKwargs = [("a", json!(1)), ("b", json!(2)), ("c", json!(3))].into_iter().collect();

        kwargs.remove("a");

        let keys: Vec<_> = kwargs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn truthiness_follows_json_values() {
        let kwargs: CallKwargs = [
            ("yes", json!(true)),
            ("no", json!(false)),
            ("null", Value::Null),
            ("zero", json!(0)),
            ("one", json!(1)),
            ("empty", json!("")),
            ("list", json!(["x"])),
        ]
        .into_iter()
        .collect();

        assert!(kwargs.is_truthy("yes"));
        assert!(kwargs.is_truthy("one"));
        assert!(kwargs.is_truthy("list"));
        assert!(!kwargs.is_truthy("no"));
        assert!(!kwargs.is_truthy("null"));
        assert!(!kwargs.is_truthy("zero"));
        assert!(!kwargs.is_truthy("empty"));
        assert!(!kwargs.is_truthy("missing"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let kwargs: CallKwargs = [("store", json!(false))].into_iter().collect();
        assert_eq!(serde_json::to_value(&kwargs).unwrap(), json!({"store": false}));
    }
}
