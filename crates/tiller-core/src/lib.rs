//! Shared primitives for Tiller
//!
//! Header handling used by both the configuration layer and the LLM core.

#![allow(clippy::must_use_candidate)]

pub mod headers;

pub use headers::{HeaderCollision, HeaderMerge, is_sensitive_header, merge_headers};
