mod harness;

use harness::transport::{Reply, ScriptedTransport};
use harness::{client, llm_config};
use serde_json::json;
use tiller_config::{LlmConfig, ReasoningEffort};
use tiller_llm::{CallOptions, ContentBlock, Message, ToolCall, ToolDefinition};
use url::Url;

fn done() -> Reply {
    Reply::responses(json!({
        "id": "resp_1",
        "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "done"}]}]
    }))
}

#[test]
fn normal_transport_request_shape() {
    let config = LlmConfig {
        enable_encrypted_reasoning: true,
        reasoning_effort: Some(ReasoningEffort::Medium),
        max_output_tokens: Some(2048),
        ..llm_config("gpt-5-mini")
    };
    let transport = ScriptedTransport::new([done()]);
    let (llm, _) = client(config, &transport);
    let tools = [ToolDefinition::new("bash", "Run a command", json!({"type": "object"}))];

    llm.responses(
        &[Message::system("be brief"), Message::user("list files")],
        &tools,
        CallOptions::new().kwarg("temperature", 0.0).kwarg("tool_choice", "required"),
    )
    .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request["model"], "gpt-5-mini");
    assert_eq!(request["instructions"], "be brief");
    assert_eq!(request["input"][0]["role"], "user");
    assert_eq!(request["tools"][0]["name"], "bash");
    assert_eq!(request["temperature"], 1.0);
    assert_eq!(request["tool_choice"], "auto");
    assert_eq!(request["store"], false);
    assert_eq!(request["max_output_tokens"], 2048);
    assert_eq!(request["include"], json!(["reasoning.encrypted_content"]));
    assert_eq!(request["reasoning"], json!({"effort": "medium"}));
}

#[test]
fn stored_call_skips_encrypted_reasoning() {
    let config = LlmConfig {
        enable_encrypted_reasoning: true,
        ..llm_config("gpt-5-mini")
    };
    let transport = ScriptedTransport::new([done()]);
    let (llm, _) = client(config, &transport);

    llm.responses(&[Message::user("hi")], &[], CallOptions::new().store(true)).unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request["store"], true);
    assert!(request.get("include").is_none());
}

#[test]
fn prompt_cache_retention_follows_model_support() {
    let retention = |model: &str| {
        let config = LlmConfig {
            prompt_cache_retention: Some("24h".to_owned()),
            ..llm_config(model)
        };
        let transport = ScriptedTransport::new([done()]);
        let (llm, _) = client(config, &transport);
        llm.responses(&[Message::user("hi")], &[], CallOptions::new()).unwrap();
        transport.requests()[0].get("prompt_cache_retention").cloned()
    };

    assert_eq!(retention("gpt-5-mini"), Some(json!("24h")));
    assert_eq!(retention("o3-mini"), None);
}

#[test]
fn subscription_codex_transport_uses_minimal_options() {
    let config = LlmConfig {
        base_url: Some(Url::parse("https://chatgpt.com/backend-api/codex").unwrap()),
        enable_encrypted_reasoning: true,
        reasoning_effort: Some(ReasoningEffort::High),
        ..llm_config("gpt-5-codex")
    };
    let transport = ScriptedTransport::new([Reply::responses_stream(vec![json!({
        "type": "response.completed",
        "response": {"id": "resp_codex", "output": []}
    })])]);
    let (llm, _) = client(config, &transport);

    let response = llm
        .responses(&[Message::user("hi")], &[], CallOptions::new().kwarg("temperature", 0.2).store(true))
        .unwrap();

    assert_eq!(response.id, "resp_codex");
    let request = &transport.requests()[0];
    assert_eq!(request["store"], false);
    assert_eq!(request["stream"], true);
    for key in ["temperature", "tool_choice", "reasoning", "include", "max_output_tokens"] {
        assert!(request.get(key).is_none(), "{key} should be stripped");
    }
}

#[test]
fn tool_history_round_trips_into_input_items() {
    let transport = ScriptedTransport::new([done()]);
    let (llm, _) = client(llm_config("gpt-5-mini"), &transport);

    let mut assistant = Message::assistant("running");
    assistant
        .content
        .push(ContentBlock::ToolCall(ToolCall::new("call_1", "bash", r#"{"cmd":"ls"}"#)));
    let history = [Message::user("list files"), assistant, Message::tool_result("call_1", "a.txt")];

    llm.responses(&history, &[], CallOptions::new()).unwrap();

    let input = &transport.requests()[0]["input"];
    assert_eq!(input[1], json!({"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "running"}]}));
    assert_eq!(input[2]["type"], "function_call");
    assert_eq!(input[3], json!({"type": "function_call_output", "call_id": "call_1", "output": "a.txt"}));
}
