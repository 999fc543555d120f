//! Responses API wire format types

use serde::{Deserialize, Serialize};

use crate::kwargs::CallKwargs;

/// Include token requesting encrypted reasoning on stateless calls
pub const ENCRYPTED_REASONING_INCLUDE: &str = "reasoning.encrypted_content";

// -- Request types --

/// Responses request handed to the transport
///
/// Selected options (`include`, `store`, `reasoning`, `extra_headers`, ...)
/// are flattened next to the model and input.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// System instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
    /// Conversation items
    pub input: &'a [InputItem],
    /// Tool definitions
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub tools: &'a [ResponsesTool],
    /// Call options
    #[serde(flatten)]
    pub options: &'a CallKwargs,
}

/// Conversation item sent as request input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// Message from the user or assistant
    Message {
        /// Message role
        role: String,
        /// Content parts
        content: Vec<InputContent>,
    },
    /// Tool call previously made by the assistant
    FunctionCall {
        /// Call identifier
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
    /// Output of a tool call
    FunctionCallOutput {
        /// Call identifier this output answers
        call_id: String,
        /// Tool output
        output: String,
    },
    /// Reasoning item replayed on stateless calls
    Reasoning {
        /// Item identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Summary parts
        summary: Vec<ReasoningPart>,
        /// Encrypted reasoning
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted_content: Option<String>,
    },
}

/// Content part of an input message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent {
    /// User-authored text
    InputText {
        /// The text string
        text: String,
    },
    /// Assistant-authored text
    OutputText {
        /// The text string
        text: String,
    },
}

/// Function tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
}

// -- Response types --

/// Responses API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesResponse {
    /// Response identifier
    #[serde(default)]
    pub id: String,
    /// Object type
    #[serde(default = "response_object")]
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: u64,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Response status (e.g. "completed")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Output items
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponsesUsage>,
}

/// Output item within a response
///
/// Item types this crate does not interpret deserialize to `Unknown`
/// and are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message
    Message {
        /// Item identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Message role
        #[serde(default = "assistant_role")]
        role: String,
        /// Content parts
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    /// Function call requested by the model
    FunctionCall {
        /// Item identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Call identifier used to answer the call
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },
    /// Reasoning produced by the model
    Reasoning {
        /// Item identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Summary parts
        #[serde(default)]
        summary: Vec<ReasoningPart>,
        /// Raw reasoning parts
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Vec<ReasoningPart>>,
        /// Encrypted reasoning
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted_content: Option<String>,
    },
    /// Unrecognized item type
    #[serde(other)]
    Unknown,
}

/// Content part of an output message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    /// Generated text
    OutputText {
        /// The text string
        text: String,
    },
    /// Refusal message
    Refusal {
        /// Refusal text
        refusal: String,
    },
    /// Unrecognized content type
    #[serde(other)]
    Unknown,
}

/// Text part of a reasoning item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningPart {
    /// Part type ("`summary_text`" or "`reasoning_text`")
    #[serde(rename = "type", default)]
    pub part_type: String,
    /// The text string
    pub text: String,
}

/// Token usage in a response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsesUsage {
    /// Input tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens
    #[serde(default)]
    pub output_tokens: u64,
    /// Total tokens
    #[serde(default)]
    pub total_tokens: u64,
    /// Input token breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_details: Option<InputTokensDetails>,
    /// Output token breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens_details: Option<OutputTokensDetails>,
}

/// Input token breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokensDetails {
    /// Tokens served from the prompt cache
    #[serde(default)]
    pub cached_tokens: u64,
}

/// Output token breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokensDetails {
    /// Tokens spent on reasoning
    #[serde(default)]
    pub reasoning_tokens: u64,
}

// -- Streaming types --

/// Server-sent event of a streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesStreamEvent {
    /// Text delta
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Output item the delta belongs to
        #[serde(default)]
        item_id: String,
        /// Index of the output item
        #[serde(default)]
        output_index: u32,
        /// Text fragment
        delta: String,
    },
    /// Reasoning summary delta
    #[serde(rename = "response.reasoning_summary_text.delta")]
    ReasoningSummaryTextDelta {
        /// Output item the delta belongs to
        #[serde(default)]
        item_id: String,
        /// Text fragment
        delta: String,
    },
    /// Function call arguments delta
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        /// Output item the delta belongs to
        #[serde(default)]
        item_id: String,
        /// Index of the output item
        #[serde(default)]
        output_index: u32,
        /// Arguments fragment
        delta: String,
    },
    /// Response finished; carries the full response
    #[serde(rename = "response.completed")]
    Completed {
        /// The final response
        response: ResponsesResponse,
    },
    /// Response finished early (token limit or content filter)
    #[serde(rename = "response.incomplete")]
    Incomplete {
        /// The final response
        response: ResponsesResponse,
    },
    /// Response failed
    #[serde(rename = "response.failed")]
    Failed {
        /// The failed response, including its `error` object
        response: serde_json::Value,
    },
    /// Error reported mid-stream
    #[serde(rename = "error")]
    Error {
        /// Error message
        #[serde(default)]
        message: String,
        /// Error code
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    /// Event types this crate ignores
    #[serde(other)]
    Other,
}

fn assistant_role() -> String {
    "assistant".to_owned()
}

fn response_object() -> String {
    "response".to_owned()
}
