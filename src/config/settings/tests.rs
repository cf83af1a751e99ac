use super::*;
use tempfile::TempDir;

fn temp_config_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[test]
fn load_defaults_when_file_missing() {
    let dir = temp_config_dir();
    let config = Config::load_from(dir.path()).expect("load should succeed");

    assert_eq!(config.openai, OpenAiConfig::default());
    assert_eq!(config.chunking, ChunkingConfig::default());
    assert_eq!(config.base_dir, dir.path());
}

#[test]
fn save_and_reload_roundtrip() {
    let dir = temp_config_dir();
    let mut config = Config::load_from(dir.path()).expect("load should succeed");
    config.openai.base_url = "http://localhost:8080/v1".to_string();
    config.openai.embedding_model = "custom-embedder".to_string();
    config.chunking.chunk_size = 500;
    config.chunking.overlap = 50;

    config.save().expect("save should succeed");

    let reloaded = Config::load_from(dir.path()).expect("reload should succeed");
    assert_eq!(reloaded.openai.base_url, "http://localhost:8080/v1");
    assert_eq!(reloaded.openai.embedding_model, "custom-embedder");
    assert_eq!(reloaded.chunking.chunk_size, 500);
    assert_eq!(reloaded.chunking.overlap, 50);
}

#[test]
fn api_url_gains_trailing_slash() {
    let openai = OpenAiConfig::default();
    let url = openai.api_url().expect("url should parse");

    assert!(url.as_str().ends_with('/'));
    assert_eq!(
        url.join("embeddings").expect("join should succeed").as_str(),
        "https://api.openai.com/v1/embeddings"
    );
}

#[test]
fn rejects_invalid_base_url() {
    let openai = OpenAiConfig {
        base_url: "not a url".to_string(),
        ..OpenAiConfig::default()
    };

    assert!(matches!(
        openai.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));
}

#[test]
fn rejects_empty_model_name() {
    let openai = OpenAiConfig {
        embedding_model: "  ".to_string(),
        ..OpenAiConfig::default()
    };

    assert!(matches!(
        openai.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn rejects_out_of_range_timeout() {
    let openai = OpenAiConfig {
        timeout_seconds: 0,
        ..OpenAiConfig::default()
    };

    assert!(matches!(
        openai.validate(),
        Err(ConfigError::InvalidTimeout(0))
    ));
}

#[test]
fn rejects_zero_chunk_size() {
    let dir = temp_config_dir();
    let mut config = Config::load_from(dir.path()).expect("load should succeed");
    config.chunking.chunk_size = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));
}
