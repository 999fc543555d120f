use std::collections::HashMap;
use std::sync::OnceLock;

use http::header::{self, HeaderName};
use indexmap::IndexMap;

/// An existing header whose value was replaced during a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCollision<V> {
    /// Header name, in the casing it was first seen with
    pub name: String,
    /// Value before the merge
    pub old: V,
    /// Value after the merge
    pub new: V,
}

/// Result of merging two header mappings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMerge<V> {
    /// Merged headers, in insertion order
    pub headers: IndexMap<String, V>,
    /// Replacements that changed an existing value
    pub collisions: Vec<HeaderCollision<V>>,
}

/// Merge `additions` into `existing`, matching names case-insensitively
///
/// The casing of the first-seen name is kept and the added value wins.
/// A collision is recorded only when the replaced value differs. Names
/// introduced by `additions` take part in matching for the rest of the merge.
pub fn merge_headers<V>(existing: &IndexMap<String, V>, additions: &IndexMap<String, V>) -> HeaderMerge<V>
where
    V: Clone + PartialEq,
{
    let mut headers = existing.clone();
    let mut canonical: HashMap<String, String> = HashMap::with_capacity(existing.len() + additions.len());

    for name in existing.keys() {
        canonical.entry(name.to_ascii_lowercase()).or_insert_with(|| name.clone());
    }

    let mut collisions = Vec::new();

    for (name, value) in additions {
        let lower = name.to_ascii_lowercase();

        let Some(seen) = canonical.get(&lower) else {
            headers.insert(name.clone(), value.clone());
            canonical.insert(lower, name.clone());
            continue;
        };

        if let Some(current) = headers.get_mut(seen) {
            if *current != *value {
                collisions.push(HeaderCollision {
                    name: seen.clone(),
                    old: current.clone(),
                    new: value.clone(),
                });
            }
            *current = value.clone();
        }
    }

    HeaderMerge { headers, collisions }
}

/// Headers whose values must not be written to logs
static SENSITIVE: OnceLock<[HeaderName; 6]> = OnceLock::new();

fn sensitive_headers() -> &'static [HeaderName] {
    SENSITIVE.get_or_init(|| {
        [
            header::AUTHORIZATION,
            header::PROXY_AUTHORIZATION,
            header::COOKIE,
            header::SET_COOKIE,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("api-key"),
        ]
    })
}

/// Check whether a header carries credentials
///
/// Names that are not valid HTTP header names are never sensitive.
pub fn is_sensitive_header(name: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok_and(|name| sensitive_headers().contains(&name))
}
