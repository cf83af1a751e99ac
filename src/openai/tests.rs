use super::*;
use serial_test::serial;

fn test_config() -> OpenAiConfig {
    OpenAiConfig {
        api_key: Some("test-key".to_string()),
        ..OpenAiConfig::default()
    }
}

#[test]
fn client_configuration() {
    let client = OpenAiClient::new(&test_config()).expect("Failed to create client");

    assert_eq!(client.embedding_model, "text-embedding-3-small");
    assert_eq!(client.chat_model, "gpt-4o-mini");
    assert_eq!(client.base_url.host_str(), Some("api.openai.com"));
}

#[test]
#[serial]
fn missing_api_key_is_a_configuration_error() {
    // SAFETY: test is serialized; no other thread reads the environment
    unsafe {
        std::env::remove_var("OPENAI_API_KEY");
    }

    let config = OpenAiConfig::default();
    let result = OpenAiClient::new(&config);

    assert!(matches!(result, Err(AulaError::Config(_))));
}

#[test]
#[serial]
fn api_key_falls_back_to_environment() {
    // SAFETY: test is serialized; no other thread reads the environment
    unsafe {
        std::env::set_var("OPENAI_API_KEY", "env-key");
    }

    let config = OpenAiConfig::default();
    let client = OpenAiClient::new(&config).expect("env key should be picked up");
    assert_eq!(client.api_key, "env-key");

    // SAFETY: test is serialized; no other thread reads the environment
    unsafe {
        std::env::remove_var("OPENAI_API_KEY");
    }
}

#[test]
fn parses_single_embedding() {
    let body = r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#;
    let vector = parse_single_embedding(body).expect("parse should succeed");

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[test]
fn empty_data_is_a_provider_error() {
    let body = r#"{"data":[]}"#;
    let result = parse_single_embedding(body);

    assert!(matches!(result, Err(AulaError::Provider(_))));
}

#[test]
fn malformed_payload_is_a_provider_error() {
    let result = parse_single_embedding("not json");
    assert!(matches!(result, Err(AulaError::Provider(_))));

    let result = parse_single_embedding(r#"{"unexpected":true}"#);
    assert!(matches!(result, Err(AulaError::Provider(_))));
}

#[test]
fn batch_count_must_match_input_count() {
    let body = r#"{"data":[{"embedding":[0.1]},{"embedding":[0.2]}]}"#;

    let vectors = parse_batch_embeddings(body, 2).expect("matching count should parse");
    assert_eq!(vectors.len(), 2);

    let result = parse_batch_embeddings(body, 3);
    assert!(matches!(result, Err(AulaError::Provider(_))));
}

#[test]
fn parses_chat_content() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello there"}}]}"#;
    let content = parse_chat_content(body).expect("parse should succeed");

    assert_eq!(content.as_deref(), Some("Hello there"));
}

#[test]
fn missing_chat_content_yields_none() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
    assert_eq!(parse_chat_content(body).expect("parse should succeed"), None);

    let body = r#"{"choices":[]}"#;
    assert_eq!(parse_chat_content(body).expect("parse should succeed"), None);
}

#[test]
fn prompt_roles_serialize_lowercase() {
    let message = PromptMessage::new(PromptRole::System, "be helpful");
    let json = serde_json::to_string(&message).expect("serialization should succeed");

    assert_eq!(json, r#"{"role":"system","content":"be helpful"}"#);
}
