mod harness;

use std::sync::{Arc, Mutex};

use harness::transport::{Reply, ScriptedTransport};
use harness::{client, llm_config};
use serde_json::json;
use tiller_config::LlmConfig;
use tiller_llm::{CallOptions, LlmError, LlmStreamChunk, Message, TokenCallback};

fn recorder() -> (TokenCallback, Arc<Mutex<Vec<LlmStreamChunk>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let callback: TokenCallback = Arc::new(move |chunk: &LlmStreamChunk| recorded.lock().unwrap().push(chunk.clone()));
    (callback, seen)
}

#[test]
fn streaming_without_callback_never_reaches_the_transport() {
    let transport = ScriptedTransport::new(Vec::<Reply>::new());
    let (llm, _) = client(llm_config("gpt-4o"), &transport);

    let err = llm
        .completion(&[Message::user("Hello")], &[], CallOptions::new().stream(true))
        .unwrap_err();

    assert!(matches!(err, LlmError::Configuration(_)));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn configured_streaming_also_requires_callback() {
    let config = LlmConfig {
        stream: true,
        ..llm_config("gpt-5-mini")
    };
    let transport = ScriptedTransport::new(Vec::<Reply>::new());
    let (llm, _) = client(config, &transport);

    let err = llm.responses(&[Message::user("Hello")], &[], CallOptions::new()).unwrap_err();

    assert!(matches!(err, LlmError::Configuration(_)));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn chat_stream_forwards_deltas_and_records_usage_once() {
    let transport = ScriptedTransport::new([Reply::chat_stream(vec![
        json!({"id": "chatcmpl-s", "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hel"}}]}),
        json!({"id": "chatcmpl-s", "choices": [{"index": 0, "delta": {"content": "lo"}, "finish_reason": "stop"}]}),
        json!({"id": "chatcmpl-s", "choices": [], "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}}),
    ])]);
    let (llm, _) = client(llm_config("gpt-4o"), &transport);
    let (callback, seen) = recorder();

    let response = llm
        .completion(&[Message::user("Hello")], &[], CallOptions::new().stream(true).on_token(callback))
        .unwrap();

    assert_eq!(response.text(), "Hello");
    assert_eq!(response.usage.total(), 5);
    assert_eq!(llm.usage().len(), 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], LlmStreamChunk::Text { delta: "Hel".to_owned() });
    assert_eq!(seen[1], LlmStreamChunk::Text { delta: "lo".to_owned() });
    assert!(seen[2].is_final());
    assert_eq!(seen.len(), 3);

    let request = &transport.requests()[0];
    assert_eq!(request["stream"], true);
    assert_eq!(request["stream_options"], json!({"include_usage": true}));
}

#[test]
fn responses_stream_uses_the_completed_response() {
    let transport = ScriptedTransport::new([Reply::responses_stream(vec![
        json!({"type": "response.created", "response": {"id": "resp_s"}}),
        json!({"type": "response.reasoning_summary_text.delta", "item_id": "rs_1", "delta": "thinking"}),
        json!({"type": "response.output_text.delta", "item_id": "msg_1", "output_index": 1, "delta": "Hi"}),
        json!({"type": "response.completed", "response": {
            "id": "resp_s",
            "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Hi there"}]}],
            "usage": {"input_tokens": 4, "output_tokens": 2, "total_tokens": 6}
        }}),
    ])]);
    let (llm, _) = client(llm_config("gpt-5-mini"), &transport);
    let (callback, seen) = recorder();

    let response = llm
        .responses(&[Message::user("Hello")], &[], CallOptions::new().stream(true).on_token(callback))
        .unwrap();

    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.id, "resp_s");

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[..2],
        [
            LlmStreamChunk::Reasoning { delta: "thinking".to_owned() },
            LlmStreamChunk::Text { delta: "Hi".to_owned() },
        ]
    );
    assert_eq!(
        seen[2],
        LlmStreamChunk::Completed {
            usage: response.usage
        }
    );

    let totals = llm.usage().totals();
    assert_eq!(totals.prompt_tokens, 4);
    assert_eq!(totals.completion_tokens, 2);
}

#[test]
fn truncated_responses_stream_is_invalid() {
    let transport = ScriptedTransport::new([Reply::responses_stream(vec![json!({
        "type": "response.output_text.delta", "item_id": "msg_1", "output_index": 0, "delta": "Hi"
    })])]);
    let (llm, _) = client(llm_config("gpt-5-mini"), &transport);
    let (callback, _) = recorder();

    let err = llm
        .responses(&[Message::user("Hello")], &[], CallOptions::new().stream(true).on_token(callback))
        .unwrap_err();

    assert!(matches!(err, LlmError::InvalidResponse(_)));
    assert_eq!(transport.calls(), 1);
    assert!(llm.usage().is_empty());
}

#[test]
fn failed_stream_event_is_retried_as_no_response() {
    let transport = ScriptedTransport::new([
        Reply::responses_stream(vec![json!({
            "type": "response.failed",
            "response": {"error": {"message": "Invalid response: choices missing"}}
        })]),
        Reply::responses(json!({"id": "resp_ok", "output": []})),
    ]);
    let (llm, _) = client(llm_config("gpt-5-mini"), &transport);
    let (callback, _) = recorder();

    let response = llm
        .responses(&[Message::user("Hello")], &[], CallOptions::new().stream(true).on_token(callback))
        .unwrap();

    assert_eq!(response.id, "resp_ok");
    assert_eq!(transport.calls(), 2);
}

#[test]
fn retried_stream_tells_the_callback_to_start_over() {
    let transport = ScriptedTransport::new([
        Reply::responses_stream(vec![
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "output_index": 0, "delta": "Par"}),
            json!({"type": "response.failed", "response": {"error": {"message": "assert choices"}}}),
        ]),
        Reply::responses_stream(vec![
            json!({"type": "response.output_text.delta", "item_id": "msg_2", "output_index": 0, "delta": "Full"}),
            json!({"type": "response.completed", "response": {
                "id": "resp_2",
                "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Full"}]}]
            }}),
        ]),
    ]);
    let (llm, _) = client(llm_config("gpt-5-mini"), &transport);
    let (callback, seen) = recorder();

    let response = llm
        .responses(&[Message::user("Hello")], &[], CallOptions::new().stream(true).on_token(callback))
        .unwrap();

    assert_eq!(response.text(), "Full");
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[..3],
        [
            LlmStreamChunk::Text { delta: "Par".to_owned() },
            LlmStreamChunk::Restart { attempt: 2 },
            LlmStreamChunk::Text { delta: "Full".to_owned() },
        ]
    );
    assert!(seen[3].is_final());
    assert_eq!(seen.len(), 4);
}
