//! Conversion between internal types and the responses wire format

use crate::error::{LlmError, TransportError, TransportErrorKind};
use crate::protocol::responses::{
    InputContent, InputItem, OutputContent, OutputItem, ReasoningPart, ResponsesResponse, ResponsesStreamEvent,
    ResponsesTool, ResponsesUsage,
};
use crate::types::{ContentBlock, LlmResponse, LlmStreamChunk, Message, Reasoning, Role, TokenUsage, ToolCall, ToolDefinition};

// -- Outbound: internal types -> responses wire format --

/// Convert a conversation to responses input
///
/// System text becomes the instructions (several system messages are joined
/// with blank lines). Reasoning is replayed only when it carries encrypted
/// content, which stateless calls need to continue a reasoning chain.
pub fn to_responses_input(messages: &[Message]) -> (Option<String>, Vec<InputItem>) {
    let mut instructions = Vec::new();
    let mut items = Vec::new();

    for message in messages {
        if message.role == Role::System {
            let text = message.joined_text();
            if !text.is_empty() {
                instructions.push(text);
            }
            continue;
        }

        for block in &message.content {
            match block {
                ContentBlock::Text { text } => {
                    let part = if message.role == Role::Assistant {
                        InputContent::OutputText { text: text.clone() }
                    } else {
                        InputContent::InputText { text: text.clone() }
                    };
                    let role = if message.role == Role::Assistant { Role::Assistant } else { Role::User };
                    items.push(InputItem::Message {
                        role: role.as_str().to_owned(),
                        content: vec![part],
                    });
                }
                ContentBlock::ToolCall(call) => items.push(InputItem::FunctionCall {
                    call_id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                }),
                ContentBlock::ToolResult { tool_call_id, content } => items.push(InputItem::FunctionCallOutput {
                    call_id: tool_call_id.clone(),
                    output: content.clone(),
                }),
                ContentBlock::Reasoning(reasoning) if reasoning.encrypted_content.is_some() => {
                    items.push(InputItem::Reasoning {
                        id: reasoning.id.clone(),
                        summary: reasoning
                            .summary
                            .iter()
                            .map(|text| ReasoningPart {
                                part_type: "summary_text".to_owned(),
                                text: text.clone(),
                            })
                            .collect(),
                        encrypted_content: reasoning.encrypted_content.clone(),
                    });
                }
                ContentBlock::Reasoning(_) => {}
            }
        }
    }

    let instructions = (!instructions.is_empty()).then(|| instructions.join("\n\n"));
    (instructions, items)
}

impl From<&ToolDefinition> for ResponsesTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        }
    }
}

// -- Inbound: responses wire format -> internal types --

impl From<&ResponsesUsage> for TokenUsage {
    fn from(usage: &ResponsesUsage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            cache_read_tokens: usage.input_tokens_details.as_ref().map_or(0, |d| d.cached_tokens),
            reasoning_tokens: usage.output_tokens_details.as_ref().map_or(0, |d| d.reasoning_tokens),
        }
    }
}

/// Build the uniform response from a normalized responses-API response
///
/// Output text parts of every message item are joined with newlines.
/// Reasoning items are merged into one [`Reasoning`].
pub fn assemble_responses(response: ResponsesResponse) -> Result<LlmResponse, LlmError> {
    let raw = serde_json::to_value(&response).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let usage = response.usage.as_ref().map(TokenUsage::from).unwrap_or_default();

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    let mut reasoning: Option<Reasoning> = None;

    for item in response.output {
        match item {
            OutputItem::Message { content, .. } => {
                texts.extend(content.into_iter().filter_map(|part| match part {
                    OutputContent::OutputText { text } => Some(text),
                    OutputContent::Refusal { .. } | OutputContent::Unknown => None,
                }));
            }
            OutputItem::FunctionCall {
                call_id, name, arguments, ..
            } => tool_calls.push(ToolCall::new(call_id, name, arguments)),
            OutputItem::Reasoning {
                id,
                summary,
                content,
                encrypted_content,
            } => {
                let merged = reasoning.get_or_insert_with(|| Reasoning {
                    id,
                    ..Reasoning::default()
                });
                merged.summary.extend(summary.into_iter().map(|part| part.text));
                merged
                    .content
                    .extend(content.unwrap_or_default().into_iter().map(|part| part.text));
                if encrypted_content.is_some() {
                    merged.encrypted_content = encrypted_content;
                }
            }
            OutputItem::Unknown => {}
        }
    }

    let mut blocks = Vec::new();
    if let Some(reasoning) = &reasoning {
        blocks.push(ContentBlock::Reasoning(reasoning.clone()));
    }
    if !texts.is_empty() {
        blocks.push(ContentBlock::Text { text: texts.join("\n") });
    }
    blocks.extend(tool_calls.iter().cloned().map(ContentBlock::ToolCall));

    Ok(LlmResponse {
        id: response.id,
        message: Message {
            role: Role::Assistant,
            content: blocks,
        },
        tool_calls,
        reasoning,
        usage,
        raw,
    })
}

/// Follows a responses event stream until its terminal event
#[derive(Debug, Default)]
pub struct ResponsesStreamCollector {
    response: Option<ResponsesResponse>,
}

impl ResponsesStreamCollector {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb `event`, returning the delta to forward to the token callback
    ///
    /// Failure events become transport errors so they go through the same
    /// classification as a failed non-streaming call.
    pub fn push(&mut self, event: ResponsesStreamEvent) -> Result<Option<LlmStreamChunk>, TransportError> {
        match event {
            ResponsesStreamEvent::OutputTextDelta { delta, .. } => Ok(Some(LlmStreamChunk::Text { delta })),
            ResponsesStreamEvent::ReasoningSummaryTextDelta { delta, .. } => {
                Ok(Some(LlmStreamChunk::Reasoning { delta }))
            }
            ResponsesStreamEvent::FunctionCallArgumentsDelta {
                output_index, delta, ..
            } => Ok(Some(LlmStreamChunk::ToolCall {
                index: output_index,
                id: None,
                name: None,
                arguments: delta,
            })),
            ResponsesStreamEvent::Completed { response } | ResponsesStreamEvent::Incomplete { response } => {
                self.response = Some(response);
                Ok(None)
            }
            ResponsesStreamEvent::Failed { response } => {
                let message = response
                    .pointer("/error/message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("response failed");
                Err(TransportError::internal_server(message))
            }
            ResponsesStreamEvent::Error { message, code } => {
                let kind = match code.as_deref() {
                    Some("rate_limit_exceeded") => TransportErrorKind::RateLimited,
                    Some("server_error") | None => TransportErrorKind::InternalServer,
                    Some(_) => TransportErrorKind::Other,
                };
                Err(TransportError::new(kind, message))
            }
            ResponsesStreamEvent::Other => Ok(None),
        }
    }

    /// Whether the terminal event was seen
    pub const fn is_done(&self) -> bool {
        self.response.is_some()
    }

    /// The response carried by the terminal event
    pub fn finish(self) -> Result<ResponsesResponse, LlmError> {
        self.response
            .ok_or_else(|| LlmError::InvalidResponse("stream ended before response.completed".to_owned()))
    }
}
