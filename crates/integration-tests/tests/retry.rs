mod harness;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use harness::transport::{Reply, ScriptedTransport, chat_empty, chat_text};
use harness::{client, llm_config};
use tiller_config::LlmConfig;
use tiller_llm::{CallOptions, LlmError, Message, RetryPolicy, TransportError, TransportErrorKind};

fn hello() -> Vec<Message> {
    vec![Message::user("Hello")]
}

#[test]
fn empty_choices_are_retried_until_success() {
    let transport = ScriptedTransport::new([chat_empty(), chat_empty(), chat_text("finally")]);
    let (llm, sleeper) = client(llm_config("gpt-4o"), &transport);

    let response = llm.completion(&hello(), &[], CallOptions::new()).unwrap();

    assert_eq!(response.text(), "finally");
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.slept(), [Duration::from_secs(8), Duration::from_secs(8)]);
    assert_eq!(llm.usage().len(), 1);
}

#[test]
fn persistent_failure_stops_at_max_attempts() {
    let config = LlmConfig {
        retry: tiller_config::RetryConfig {
            max_attempts: 4,
            ..tiller_config::RetryConfig::default()
        },
        ..llm_config("gpt-4o")
    };
    let transport = ScriptedTransport::new((0..4).map(|_| Reply::Fail(TransportError::connection("reset by peer"))));
    let (llm, sleeper) = client(config, &transport);

    let err = llm.completion(&hello(), &[], CallOptions::new()).unwrap_err();

    assert_eq!(transport.calls(), 4);
    assert_eq!(err.attempts(), Some(4));
    assert_eq!(err.transport_error().map(|e| e.kind), Some(TransportErrorKind::Connection));
    assert_eq!(sleeper.slept().len(), 3);
    assert!(llm.usage().is_empty());
}

#[test]
fn malformed_response_bumps_zero_temperature() {
    let config = LlmConfig {
        temperature: Some(0.0),
        ..llm_config("gpt-4o")
    };
    let transport = ScriptedTransport::new([
        Reply::Fail(TransportError::internal_server(
            "litellm.InternalServerError: 'NoneType' object: choices is None",
        )),
        chat_text("ok"),
    ]);
    let (llm, _) = client(config, &transport);

    llm.completion(&hello(), &[], CallOptions::new()).unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0]["temperature"], 0.0);
    assert_eq!(requests[1]["temperature"], 1.0);
}

#[test]
fn non_zero_temperature_survives_retries() {
    let transport = ScriptedTransport::new([chat_empty(), chat_text("ok")]);
    let (llm, _) = client(llm_config("gpt-4o"), &transport);

    llm.completion(&hello(), &[], CallOptions::new().kwarg("temperature", 2.0))
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0]["temperature"], 2.0);
    assert_eq!(requests[1]["temperature"], 2.0);
}

#[test]
fn fatal_errors_are_not_retried() {
    let transport = ScriptedTransport::new([Reply::Fail(TransportError::bad_request("unknown parameter"))]);
    let (llm, sleeper) = client(llm_config("gpt-4o"), &transport);

    let err = llm.completion(&hello(), &[], CallOptions::new()).unwrap_err();

    assert!(matches!(err, LlmError::Transport(ref e) if e.kind == TransportErrorKind::BadRequest));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.slept().is_empty());
}

#[test]
fn unrelated_internal_errors_are_raised_on_first_occurrence() {
    let transport = ScriptedTransport::new([
        Reply::Fail(TransportError::internal_server("upstream exploded")),
        chat_text("ok"),
    ]);
    let (llm, sleeper) = client(llm_config("gpt-4o"), &transport);

    let err = llm.completion(&hello(), &[], CallOptions::new()).unwrap_err();

    assert!(matches!(err, LlmError::Transport(ref e) if e.kind == TransportErrorKind::InternalServer));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.slept().is_empty());
}

#[test]
fn choices_internal_errors_are_retried_with_default_config() {
    let transport = ScriptedTransport::new([
        Reply::Fail(TransportError::internal_server("litellm: choices is None")),
        chat_text("ok"),
    ]);
    let (llm, _) = client(llm_config("gpt-4o"), &transport);

    let response = llm.completion(&hello(), &[], CallOptions::new()).unwrap();

    assert_eq!(response.text(), "ok");
    assert_eq!(transport.calls(), 2);
}

#[test]
fn zero_attempts_calls_once() {
    let transport = ScriptedTransport::new([chat_empty()]);
    let (llm, _) = client(llm_config("gpt-4o"), &transport);
    let llm = llm.with_retry_policy(RetryPolicy {
        max_attempts: 0,
        ..RetryPolicy::default()
    });

    let err = llm.completion(&hello(), &[], CallOptions::new()).unwrap_err();

    assert!(matches!(err, LlmError::NoResponse { .. }));
    assert_eq!(transport.calls(), 1);
}

#[test]
fn listener_is_told_about_each_retry() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let transport = ScriptedTransport::new([chat_empty(), chat_empty(), chat_text("ok")]);
    let (llm, _) = client(llm_config("gpt-4o"), &transport);
    let llm = llm.with_retry_listener(Arc::new(move |attempt: u32, max: u32| {
        recorded.lock().unwrap().push((attempt, max));
    }));

    llm.completion(&hello(), &[], CallOptions::new()).unwrap();

    assert_eq!(*seen.lock().unwrap(), [(1, 5), (2, 5)]);
}

#[test]
fn responses_failures_follow_the_same_policy() {
    let transport = ScriptedTransport::new([
        Reply::Fail(TransportError::service_unavailable("overloaded")),
        Reply::responses(serde_json::json!({
            "id": "resp_1",
            "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "done"}]}]
        })),
    ]);
    let (llm, sleeper) = client(llm_config("gpt-5-mini"), &transport);

    let response = llm.responses(&hello(), &[], CallOptions::new()).unwrap();

    assert_eq!(response.text(), "done");
    assert_eq!(transport.calls(), 2);
    assert_eq!(sleeper.slept().len(), 1);
}
