//! LLM completion core for Tiller
//!
//! Sends conversations through an injected [`Transport`] using either the
//! chat-completions or the responses API shape. Around every call it selects
//! request options, merges gateway headers, retries classified failures with
//! exponential backoff, repairs tool-call arguments for models that encode
//! nested values as JSON strings, and assembles a uniform [`LlmResponse`]
//! with usage counters.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod features;
pub mod gateway;
pub mod kwargs;
pub mod llm;
pub mod normalize;
pub mod options;
pub mod protocol;
pub mod retry;
pub mod transport;
pub mod types;
pub mod usage;

pub use error::{LlmError, TransportError, TransportErrorKind};
pub use features::{FeatureTable, ModelFeatures, PatternFeatureTable};
pub use gateway::Gateway;
pub use kwargs::CallKwargs;
pub use llm::{CallOptions, Llm, TokenCallback};
pub use normalize::ArgumentNormalizer;
pub use retry::{ErrorClass, RetryController, RetryListener, RetryPolicy, Sleeper, ThreadSleeper};
pub use transport::{Endpoint, EventStream, Transport, TransportResponse};
pub use types::{
    ContentBlock, LlmResponse, LlmStreamChunk, Message, Reasoning, Role, TokenUsage, ToolCall, ToolDefinition,
};
pub use usage::{UsageAccumulator, UsageRecord};
