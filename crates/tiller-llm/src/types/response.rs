use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::message::{Message, Role, ToolCall};

/// Token usage counters for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u64,
    /// Tokens generated in the completion
    pub completion_tokens: u64,
    /// Prompt tokens served from the provider cache
    pub cache_read_tokens: u64,
    /// Completion tokens spent on reasoning
    pub reasoning_tokens: u64,
}

impl TokenUsage {
    /// Prompt plus completion tokens
    pub const fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
        self.cache_read_tokens += rhs.cache_read_tokens;
        self.reasoning_tokens += rhs.reasoning_tokens;
    }
}

/// Reasoning returned alongside a response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    /// Provider item identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Summary segments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    /// Raw reasoning segments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,
    /// Opaque encrypted reasoning for stateless follow-up calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
}

/// Uniform response produced from either wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Provider response identifier
    pub id: String,
    /// Assistant message carrying the text content
    pub message: Message,
    /// Tool calls, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Reasoning, when the provider returned any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
    /// Token usage
    pub usage: TokenUsage,
    /// Provider response after argument normalization
    pub raw: serde_json::Value,
}

impl LlmResponse {
    /// Text content joined with newlines
    pub fn text(&self) -> String {
        self.message.joined_text()
    }

    /// Whether the assistant role was reported
    pub fn is_assistant(&self) -> bool {
        self.message.role == Role::Assistant
    }
}
