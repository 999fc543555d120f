//! Completion client composing option selection, gateway headers, retry,
//! argument normalization and response assembly

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use tiller_config::LlmConfig;

use crate::convert::chat::{ChatStreamAccumulator, assemble_chat, to_chat_messages};
use crate::convert::responses::{ResponsesStreamCollector, assemble_responses, to_responses_input};
use crate::error::LlmError;
use crate::features::{FeatureTable, ModelFeatures, PatternFeatureTable};
use crate::gateway::Gateway;
use crate::kwargs::CallKwargs;
use crate::normalize::ArgumentNormalizer;
use crate::options::{select_chat_options, select_responses_options};
use crate::protocol::chat::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatTool};
use crate::protocol::responses::{ResponsesRequest, ResponsesResponse, ResponsesStreamEvent, ResponsesTool};
use crate::retry::{RetryController, RetryListener, RetryPolicy, Sleeper};
use crate::transport::{Endpoint, EventStream, Transport, TransportResponse};
use crate::types::{LlmResponse, LlmStreamChunk, Message, ToolDefinition};
use crate::usage::{UsageAccumulator, UsageRecord};

/// Receives stream deltas as they arrive
pub type TokenCallback = Arc<dyn Fn(&LlmStreamChunk) + Send + Sync>;

/// Per-call overrides
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Extra provider kwargs (`temperature`, `extra_headers`, ...)
    pub kwargs: CallKwargs,
    /// Stream the response; defaults to the configured value
    pub stream: Option<bool>,
    /// Callback for stream deltas, required when streaming
    ///
    /// When a streamed attempt fails and is retried, the callback receives
    /// [`LlmStreamChunk::Restart`] before the new attempt's deltas.
    pub on_token: Option<TokenCallback>,
    /// Extra `include` entries for the responses API
    pub include: Option<Vec<String>>,
    /// Persist the response server-side (responses API)
    pub store: Option<bool>,
}

impl CallOptions {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one provider kwarg
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key, value);
        self
    }

    /// Request or suppress streaming
    #[must_use]
    pub const fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Forward stream deltas to `callback`
    #[must_use]
    pub fn on_token(mut self, callback: TokenCallback) -> Self {
        self.on_token = Some(callback);
        self
    }

    /// Extra `include` entries
    #[must_use]
    pub fn include(mut self, include: Vec<String>) -> Self {
        self.include = Some(include);
        self
    }

    /// Explicit `store` flag
    #[must_use]
    pub const fn store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("kwargs", &self.kwargs)
            .field("stream", &self.stream)
            .field("on_token", &self.on_token.is_some())
            .field("include", &self.include)
            .field("store", &self.store)
            .finish()
    }
}

/// Completion client for one configured model
///
/// Calls block the current thread, including the backoff between retries.
/// One client may be shared across threads; only the usage log is shared
/// between calls.
pub struct Llm {
    config: LlmConfig,
    transport: Arc<dyn Transport>,
    features: Arc<dyn FeatureTable>,
    normalizer: ArgumentNormalizer,
    retry: RetryController,
    gateway: Gateway,
    endpoint: Endpoint,
    usage: Arc<UsageAccumulator>,
}

impl Llm {
    /// Build a client from configuration
    pub fn new(config: LlmConfig, transport: Arc<dyn Transport>) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::Configuration("model must not be empty".to_owned()));
        }

        let features: Arc<dyn FeatureTable> = Arc::new(PatternFeatureTable::from_config(&config));
        let retry = RetryController::new(RetryPolicy::from_config(&config.retry)?);
        let endpoint = Endpoint::from_config(&config)?;

        Ok(Self {
            normalizer: ArgumentNormalizer::new(Arc::clone(&features)),
            gateway: Gateway::new(&config.custom_headers),
            features,
            retry,
            endpoint,
            transport,
            config,
            usage: Arc::new(UsageAccumulator::new()),
        })
    }

    /// Use `table` for model features instead of the configured rules
    #[must_use]
    pub fn with_feature_table(mut self, table: Arc<dyn FeatureTable>) -> Self {
        self.normalizer = ArgumentNormalizer::new(Arc::clone(&table));
        self.features = table;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = self.retry.with_policy(policy);
        self
    }

    /// Notify `listener` with `(attempt, max_attempts)` before every retry
    #[must_use]
    pub fn with_retry_listener(mut self, listener: RetryListener) -> Self {
        self.retry = self.retry.with_listener(listener);
        self
    }

    /// Replace the sleeper used between retries
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry = self.retry.with_sleeper(sleeper);
        self
    }

    /// Share `usage` with other clients
    #[must_use]
    pub fn with_usage_accumulator(mut self, usage: Arc<UsageAccumulator>) -> Self {
        self.usage = usage;
        self
    }

    /// Bound configuration
    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Usage recorded by this client
    pub const fn usage(&self) -> &Arc<UsageAccumulator> {
        &self.usage
    }

    /// Features of the configured model
    pub fn model_features(&self) -> ModelFeatures {
        self.features.features(&self.config.model)
    }

    /// Options the responses API would be called with
    pub fn responses_options(&self, options: &CallOptions) -> CallKwargs {
        let kwargs = select_responses_options(
            &self.config,
            self.model_features(),
            options.kwargs.clone(),
            options.include.as_deref(),
            options.store,
        );
        self.gateway.prepare_request_kwargs(kwargs)
    }

    /// Call the chat-completions API
    pub fn completion(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: CallOptions,
    ) -> Result<LlmResponse, LlmError> {
        let CallOptions {
            kwargs,
            stream,
            on_token,
            ..
        } = options;
        let stream = stream.unwrap_or(self.config.stream);
        let on_token = stream_callback(stream, on_token.as_ref())?;

        let mut kwargs = select_chat_options(&self.config, kwargs);
        if stream {
            kwargs.insert("stream", true);
            kwargs.insert("stream_options", json!({ "include_usage": true }));
        }
        let mut kwargs = self.gateway.prepare_request_kwargs(kwargs);

        let model = self.config.model.as_str();
        let chat_messages = to_chat_messages(messages);
        let chat_tools: Vec<ChatTool> = tools.iter().map(ChatTool::from).collect();

        tracing::debug!(model, stream, messages = chat_messages.len(), tools = chat_tools.len(), "sending chat completion");

        let mut attempt = 0;
        let response = self.retry.run(&mut kwargs, |call_kwargs| {
            attempt += 1;
            announce_restart(on_token, attempt);
            let request = ChatCompletionRequest {
                model,
                messages: &chat_messages,
                tools: &chat_tools,
                options: call_kwargs,
            };
            let raw = match self.transport.chat_completion(&self.endpoint, &request)? {
                TransportResponse::Complete(response) => response,
                TransportResponse::Stream(events) => collect_chat_stream(events, on_token)?,
            };
            assemble_chat(self.normalizer.normalize_chat_completion(model, raw))
        })?;

        Ok(self.finish(response, on_token))
    }

    /// Call the responses API
    pub fn responses(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: CallOptions,
    ) -> Result<LlmResponse, LlmError> {
        let stream = options.stream.unwrap_or(self.config.stream);
        let on_token = stream_callback(stream, options.on_token.as_ref())?;

        let mut kwargs = self.responses_options(&options);
        if stream {
            kwargs.insert("stream", true);
        }

        let model = self.config.model.as_str();
        let (instructions, input) = to_responses_input(messages);
        let response_tools: Vec<ResponsesTool> = tools.iter().map(ResponsesTool::from).collect();

        tracing::debug!(model, stream, items = input.len(), tools = response_tools.len(), "sending responses call");

        let mut attempt = 0;
        let response = self.retry.run(&mut kwargs, |call_kwargs| {
            attempt += 1;
            announce_restart(on_token, attempt);
            let request = ResponsesRequest {
                model,
                instructions: instructions.as_deref(),
                input: &input,
                tools: &response_tools,
                options: call_kwargs,
            };
            let raw = match self.transport.responses(&self.endpoint, &request)? {
                TransportResponse::Complete(response) => response,
                TransportResponse::Stream(events) => collect_responses_stream(events, on_token)?,
            };
            assemble_responses(self.normalizer.normalize_responses(model, raw))
        })?;

        Ok(self.finish(response, on_token))
    }

    fn finish(&self, response: LlmResponse, on_token: Option<&TokenCallback>) -> LlmResponse {
        self.usage.record(UsageRecord {
            model: self.config.model.clone(),
            response_id: response.id.clone(),
            usage: response.usage,
        });
        if let Some(callback) = on_token {
            callback(&LlmStreamChunk::Completed { usage: response.usage });
        }
        response
    }
}

impl fmt::Debug for Llm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Llm")
            .field("model", &self.config.model)
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

/// Tell the callback that deltas from the failed attempt are void
fn announce_restart(on_token: Option<&TokenCallback>, attempt: u32) {
    if attempt > 1
        && let Some(callback) = on_token
    {
        callback(&LlmStreamChunk::Restart { attempt });
    }
}

/// Callback to use for this call, or a configuration error when streaming
/// was requested without one
fn stream_callback(stream: bool, on_token: Option<&TokenCallback>) -> Result<Option<&TokenCallback>, LlmError> {
    if !stream {
        return Ok(None);
    }
    on_token
        .map(Some)
        .ok_or_else(|| LlmError::Configuration("streaming requires an on_token callback".to_owned()))
}

fn collect_chat_stream(
    events: EventStream<ChatCompletionChunk>,
    on_token: Option<&TokenCallback>,
) -> Result<ChatCompletionResponse, LlmError> {
    let mut accumulator = ChatStreamAccumulator::new();

    for event in events {
        for delta in accumulator.push(event?) {
            if let Some(callback) = on_token {
                callback(&delta);
            }
        }
    }

    Ok(accumulator.finish())
}

fn collect_responses_stream(
    events: EventStream<ResponsesStreamEvent>,
    on_token: Option<&TokenCallback>,
) -> Result<ResponsesResponse, LlmError> {
    let mut collector = ResponsesStreamCollector::new();

    for event in events {
        if let Some(delta) = collector.push(event?)?
            && let Some(callback) = on_token
        {
            callback(&delta);
        }
        if collector.is_done() {
            break;
        }
    }

    collector.finish()
}
