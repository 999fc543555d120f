use serde::{Deserialize, Serialize};

use super::response::TokenUsage;

/// Event forwarded to the token callback during a streamed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmStreamChunk {
    /// Incremental assistant text
    Text {
        /// Text fragment
        delta: String,
    },
    /// Incremental reasoning or reasoning summary text
    Reasoning {
        /// Text fragment
        delta: String,
    },
    /// Incremental tool call
    ToolCall {
        /// Position of the tool call in the response
        index: u32,
        /// Tool call ID (first fragment only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Function name (first fragment only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Arguments fragment
        arguments: String,
    },
    /// The previous attempt failed and the call starts over; deltas
    /// received so far are void
    Restart {
        /// Attempt about to run (2 for the first retry)
        attempt: u32,
    },
    /// Stream finished; carries the final usage
    Completed {
        /// Token usage reported for the call
        usage: TokenUsage,
    },
}

impl LlmStreamChunk {
    /// Whether this is the last chunk of the stream
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
