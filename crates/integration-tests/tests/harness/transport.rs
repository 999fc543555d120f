//! Scripted in-memory transport for integration tests
//!
//! Replays queued replies in order and records every request as JSON.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tiller_llm::protocol::chat::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use tiller_llm::protocol::responses::{ResponsesRequest, ResponsesResponse, ResponsesStreamEvent};
use tiller_llm::{Endpoint, Transport, TransportError, TransportResponse};

/// Canned transport outcome
pub enum Reply {
    /// Complete chat response
    Chat(ChatCompletionResponse),
    /// Streamed chat response
    ChatStream(Vec<ChatCompletionChunk>),
    /// Complete responses-API response
    Responses(ResponsesResponse),
    /// Streamed responses-API events
    ResponsesStream(Vec<ResponsesStreamEvent>),
    /// Transport failure
    Fail(TransportError),
}

impl Reply {
    /// Chat response from JSON
    pub fn chat(value: Value) -> Self {
        Self::Chat(serde_json::from_value(value).unwrap())
    }

    /// Chat stream from JSON chunks
    pub fn chat_stream(chunks: Vec<Value>) -> Self {
        Self::ChatStream(chunks.into_iter().map(|c| serde_json::from_value(c).unwrap()).collect())
    }

    /// Responses-API response from JSON
    pub fn responses(value: Value) -> Self {
        Self::Responses(serde_json::from_value(value).unwrap())
    }

    /// Responses-API stream from JSON events
    pub fn responses_stream(events: Vec<Value>) -> Self {
        Self::ResponsesStream(events.into_iter().map(|e| serde_json::from_value(e).unwrap()).collect())
    }
}

/// Chat response with a single assistant text message
pub fn chat_text(text: &str) -> Reply {
    Reply::chat(serde_json::json!({
        "id": "chatcmpl-test",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
}

/// Chat response without choices
pub fn chat_empty() -> Reply {
    Reply::chat(serde_json::json!({"id": "chatcmpl-empty", "choices": []}))
}

/// Transport replaying queued replies
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    /// Transport replaying `replies` in order
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request received, as JSON
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls received
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: Value) -> Reply {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted")
    }
}

impl Transport for ScriptedTransport {
    fn chat_completion(
        &self,
        _endpoint: &Endpoint,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<TransportResponse<ChatCompletionResponse, ChatCompletionChunk>, TransportError> {
        match self.next(serde_json::to_value(request).unwrap()) {
            Reply::Chat(response) => Ok(TransportResponse::Complete(response)),
            Reply::ChatStream(chunks) => Ok(TransportResponse::Stream(Box::new(chunks.into_iter().map(Ok)))),
            Reply::Fail(error) => Err(error),
            Reply::Responses(_) | Reply::ResponsesStream(_) => panic!("responses reply scripted for a chat call"),
        }
    }

    fn responses(
        &self,
        _endpoint: &Endpoint,
        request: &ResponsesRequest<'_>,
    ) -> Result<TransportResponse<ResponsesResponse, ResponsesStreamEvent>, TransportError> {
        match self.next(serde_json::to_value(request).unwrap()) {
            Reply::Responses(response) => Ok(TransportResponse::Complete(response)),
            Reply::ResponsesStream(events) => Ok(TransportResponse::Stream(Box::new(events.into_iter().map(Ok)))),
            Reply::Fail(error) => Err(error),
            Reply::Chat(_) | Reply::ChatStream(_) => panic!("chat reply scripted for a responses call"),
        }
    }
}
