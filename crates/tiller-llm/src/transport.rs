//! Injected provider transport

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use tiller_config::LlmConfig;
use url::Url;

use crate::error::{LlmError, TransportError};
use crate::protocol::chat::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use crate::protocol::responses::{ResponsesRequest, ResponsesResponse, ResponsesStreamEvent};

/// Blocking stream of provider events
pub type EventStream<E> = Box<dyn Iterator<Item = Result<E, TransportError>> + Send>;

/// Where and how to reach the provider
#[derive(Clone, Default)]
pub struct Endpoint {
    /// Provider base URL
    pub base_url: Option<Url>,
    /// API key for authentication
    pub api_key: Option<SecretString>,
    /// Per-call timeout enforced by the transport
    pub timeout: Option<Duration>,
}

impl Endpoint {
    /// Endpoint described by `config`
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout().map_err(|e| LlmError::Configuration(e.to_string()))?,
        })
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Provider answer: a complete response or a stream of events
pub enum TransportResponse<R, E> {
    /// Non-streaming response
    Complete(R),
    /// Streaming response, consumed on the caller's thread
    Stream(EventStream<E>),
}

impl<R: fmt::Debug, E> fmt::Debug for TransportResponse<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Blocking completion backend for both API shapes
///
/// Implementations send the request as-is. Selected options, including
/// `stream`, `extra_headers` and `extra_body`, are flattened into the request
/// payload; transports lift `extra_headers` into HTTP headers and merge
/// `extra_body` into the JSON body.
pub trait Transport: Send + Sync {
    /// Call the chat-completions API
    fn chat_completion(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<TransportResponse<ChatCompletionResponse, ChatCompletionChunk>, TransportError>;

    /// Call the responses API
    fn responses(
        &self,
        endpoint: &Endpoint,
        request: &ResponsesRequest<'_>,
    ) -> Result<TransportResponse<ResponsesResponse, ResponsesStreamEvent>, TransportError>;
}
