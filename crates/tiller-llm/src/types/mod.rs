//! Provider-agnostic request and response types
//!
//! Both wire shapes convert to and from these types, so callers never see
//! provider-specific structures.

pub mod message;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{ContentBlock, FunctionCall, Message, Role, ToolCall};
pub use response::{LlmResponse, Reasoning, TokenUsage};
pub use stream::LlmStreamChunk;
pub use tool::ToolDefinition;
