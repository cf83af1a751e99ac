use crate::config::OpenAiConfig;

#[test]
fn base_url_validator_accepts_valid_urls() {
    let candidate = OpenAiConfig {
        base_url: "http://localhost:11434/v1".to_string(),
        ..OpenAiConfig::default()
    };

    assert!(candidate.api_url().is_ok());
}

#[test]
fn base_url_validator_rejects_garbage() {
    let candidate = OpenAiConfig {
        base_url: "::::".to_string(),
        ..OpenAiConfig::default()
    };

    assert!(candidate.api_url().is_err());
}
