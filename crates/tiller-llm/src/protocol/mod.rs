//! Wire format types for the two supported API shapes
//!
//! Plain serde structs matching the provider JSON. They are used at the
//! transport boundary and by the argument normalizer, which rewrites them in
//! place before assembly.

pub mod chat;
pub mod responses;
