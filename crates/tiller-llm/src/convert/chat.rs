//! Conversion between internal types and the chat-completions wire format

use std::collections::BTreeMap;

use crate::error::LlmError;
use crate::protocol::chat::{
    ChatChoice, ChatCompletionChunk, ChatCompletionResponse, ChatFunction, ChatFunctionCall, ChatMessage,
    ChatResponseMessage, ChatTool, ChatToolCall, ChatUsage,
};
use crate::types::{ContentBlock, LlmResponse, LlmStreamChunk, Message, Reasoning, Role, TokenUsage, ToolCall, ToolDefinition};

// -- Outbound: internal types -> chat wire format --

/// Convert a conversation to chat messages
///
/// Tool results become separate `tool` messages. Reasoning blocks are not
/// sent on this API.
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len());

    for message in messages {
        let text = message.joined_text();
        let tool_calls: Vec<ChatToolCall> = message.tool_calls().map(ChatToolCall::from).collect();
        let results: Vec<ChatMessage> = message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult { tool_call_id, content } => Some(ChatMessage {
                    role: Role::Tool.as_str().to_owned(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_call_id.clone()),
                }),
                _ => None,
            })
            .collect();

        if results.is_empty() || !text.is_empty() || !tool_calls.is_empty() {
            out.push(ChatMessage {
                role: message.role.as_str().to_owned(),
                content: (!text.is_empty() || tool_calls.is_empty()).then_some(text),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            });
        }

        out.extend(results);
    }

    out
}

impl From<&ToolCall> for ChatToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            tool_type: "function".to_owned(),
            function: ChatFunctionCall {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            },
        }
    }
}

impl From<&ToolDefinition> for ChatTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

// -- Inbound: chat wire format -> internal types --

impl From<&ChatUsage> for TokenUsage {
    fn from(usage: &ChatUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cache_read_tokens: usage.prompt_tokens_details.as_ref().map_or(0, |d| d.cached_tokens),
            reasoning_tokens: usage
                .completion_tokens_details
                .as_ref()
                .map_or(0, |d| d.reasoning_tokens),
        }
    }
}

/// Build the uniform response from a normalized chat completion
///
/// Uses the first choice. A response without choices is a no-response
/// failure, which the retry controller may retry.
pub fn assemble_chat(response: ChatCompletionResponse) -> Result<LlmResponse, LlmError> {
    let raw = serde_json::to_value(&response).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let usage = response.usage.as_ref().map(TokenUsage::from).unwrap_or_default();

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LlmError::no_response("provider returned no choices"));
    };
    let ChatResponseMessage {
        role,
        content,
        reasoning_content,
        tool_calls,
    } = choice.message;

    let reasoning = reasoning_content.filter(|r| !r.is_empty()).map(|r| Reasoning {
        content: vec![r],
        ..Reasoning::default()
    });
    let tool_calls: Vec<ToolCall> = tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
        .collect();

    let mut blocks = Vec::new();
    if let Some(reasoning) = &reasoning {
        blocks.push(ContentBlock::Reasoning(reasoning.clone()));
    }
    if let Some(text) = content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text { text });
    }
    blocks.extend(tool_calls.iter().cloned().map(ContentBlock::ToolCall));

    Ok(LlmResponse {
        id: response.id,
        message: Message {
            role: Role::from_wire(&role),
            content: blocks,
        },
        tool_calls,
        reasoning,
        usage,
        raw,
    })
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Rebuilds a complete chat response from streamed chunks
///
/// Tool-call fragments are merged by their index. Only the first choice is
/// kept.
#[derive(Debug, Default)]
pub struct ChatStreamAccumulator {
    id: String,
    created: u64,
    model: String,
    saw_choice: bool,
    role: Option<String>,
    content: String,
    reasoning: String,
    tool_calls: BTreeMap<u32, PartialToolCall>,
    finish_reason: Option<String>,
    usage: Option<ChatUsage>,
}

impl ChatStreamAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb `chunk`, returning the deltas to forward to the token callback
    pub fn push(&mut self, chunk: ChatCompletionChunk) -> Vec<LlmStreamChunk> {
        if self.id.is_empty() {
            self.id = chunk.id;
            self.created = chunk.created;
            self.model = chunk.model;
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }

        let mut forwarded = Vec::new();

        for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
            self.saw_choice = true;
            let delta = choice.delta;

            if let Some(role) = delta.role {
                self.role.get_or_insert(role);
            }
            if let Some(text) = delta.reasoning_content.filter(|t| !t.is_empty()) {
                self.reasoning.push_str(&text);
                forwarded.push(LlmStreamChunk::Reasoning { delta: text });
            }
            if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                self.content.push_str(&text);
                forwarded.push(LlmStreamChunk::Text { delta: text });
            }
            for fragment in delta.tool_calls.unwrap_or_default() {
                let entry = self.tool_calls.entry(fragment.index).or_default();
                if let Some(id) = &fragment.id {
                    entry.id.clone_from(id);
                }
                let (name, arguments) = fragment
                    .function
                    .map(|f| (f.name, f.arguments.unwrap_or_default()))
                    .unwrap_or_default();
                if let Some(name) = &name {
                    entry.name.push_str(name);
                }
                entry.arguments.push_str(&arguments);
                forwarded.push(LlmStreamChunk::ToolCall {
                    index: fragment.index,
                    id: fragment.id,
                    name,
                    arguments,
                });
            }
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }

        forwarded
    }

    /// The response the chunks describe
    ///
    /// Has no choices when the stream carried none.
    pub fn finish(self) -> ChatCompletionResponse {
        let choices = if self.saw_choice {
            let tool_calls: Vec<ChatToolCall> = self
                .tool_calls
                .into_values()
                .map(|call| ChatToolCall {
                    id: call.id,
                    tool_type: "function".to_owned(),
                    function: ChatFunctionCall {
                        name: call.name,
                        arguments: call.arguments,
                    },
                })
                .collect();

            vec![ChatChoice {
                index: 0,
                message: ChatResponseMessage {
                    role: self.role.unwrap_or_else(|| Role::Assistant.as_str().to_owned()),
                    content: (!self.content.is_empty()).then_some(self.content),
                    reasoning_content: (!self.reasoning.is_empty()).then_some(self.reasoning),
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                },
                finish_reason: self.finish_reason,
            }]
        } else {
            Vec::new()
        };

        ChatCompletionResponse {
            id: self.id,
            object: "chat.completion".to_owned(),
            created: self.created,
            model: self.model,
            choices,
            usage: self.usage,
        }
    }
}
