//! Conversion between internal types and wire formats
//!
//! Outbound: conversation messages and tool definitions to request payloads.
//! Inbound: normalized provider responses and stream events to [`LlmResponse`].
//!
//! [`LlmResponse`]: crate::types::LlmResponse

pub mod chat;
pub mod responses;
