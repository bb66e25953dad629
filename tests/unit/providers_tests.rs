/*!
 * Unit tests for endpoint clients and response content extraction
 */

use serde_json::{Value, json};

use gdtrans::app_config::Config;
use gdtrans::providers::completion::CompletionClient;
use gdtrans::providers::extract_content;
use gdtrans::providers::openai_chat::OpenAiChatClient;

fn chat_body_value(config: &Config) -> Value {
    let client = OpenAiChatClient::new(config).unwrap();
    serde_json::to_value(client.build_body("sys prompt", "user text")).unwrap()
}

fn completion_body_value(config: &Config) -> Value {
    let client = CompletionClient::new(config).unwrap();
    serde_json::to_value(client.build_body("sys prompt", "user text")).unwrap()
}

#[test]
fn test_extract_content_withChatShape_shouldFindMessageContent() {
    let value = json!({"choices": [{"message": {"content": "translated"}}]});
    assert_eq!(extract_content(&value).as_deref(), Some("translated"));
}

#[test]
fn test_extract_content_withCompletionShape_shouldFindText() {
    let value = json!({"choices": [{"text": "translated"}]});
    assert_eq!(extract_content(&value).as_deref(), Some("translated"));
}

#[test]
fn test_extract_content_withBareContentShape_shouldFindContent() {
    let value = json!({"content": "translated"});
    assert_eq!(extract_content(&value).as_deref(), Some("translated"));
}

#[test]
fn test_extract_content_withMultipleShapes_shouldPreferChatShape() {
    let value = json!({
        "choices": [{"message": {"content": "from chat"}, "text": "from text"}],
        "content": "from bare"
    });
    assert_eq!(extract_content(&value).as_deref(), Some("from chat"));
}

#[test]
fn test_extract_content_withNoKnownShape_shouldReturnNone() {
    let value = json!({"result": "translated"});
    assert_eq!(extract_content(&value), None);
}

#[test]
fn test_chat_body_shouldCarryOpenAiFields() {
    let mut config = Config::default();
    config.model = "gpt-4o-mini".to_string();
    config.presence_penalty = 0.5;
    let body = chat_body_value(&config);

    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "sys prompt");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "user text");
    assert_eq!(body["presence_penalty"], 0.5);
    assert_eq!(body["stream"], false);
    // Self-hosted penalty fields never leak into the OpenAI dialect.
    assert!(body.get("repeat_penalty").is_none());
    assert!(body.get("repetition_penalty").is_none());
}

#[test]
fn test_chat_body_withZeroOutputBudget_shouldOmitMaxTokens() {
    let config = Config::default();
    let body = chat_body_value(&config);
    assert!(body.get("max_tokens").is_none());
}

#[test]
fn test_chat_body_withOutputBudget_shouldSetMaxTokens() {
    let mut config = Config::default();
    config.max_output_tokens = 256;
    let body = chat_body_value(&config);
    assert_eq!(body["max_tokens"], 256);
}

#[test]
fn test_completion_body_shouldCarrySelfHostedFields() {
    let mut config = Config::default();
    config.repetition_penalty = 1.2;
    config.max_output_tokens = 128;
    let body = completion_body_value(&config);

    assert_eq!(body["repeat_penalty"], 1.2);
    assert_eq!(body["repetition_penalty"], 1.2);
    assert_eq!(body["n_predict"], 128);
    // Presence penalty is an OpenAI-only knob.
    assert!(body.get("presence_penalty").is_none());
    assert!(body.get("max_tokens").is_none());
}
