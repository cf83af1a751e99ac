#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::OpenAiConfig;
use crate::{AulaError, Result};

/// Embedding width used for every vector collection
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Client for an OpenAI-compatible embeddings and chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message in the conversation sent to the chat model
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    #[inline]
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Build a client from configuration. Fails when no API key is present
    /// in the config or the OPENAI_API_KEY environment variable.
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
            .ok_or_else(|| {
                AulaError::Config(
                    "No API key configured; set openai.api_key or OPENAI_API_KEY".to_string(),
                )
            })?;

        let base_url = config
            .api_url()
            .map_err(|e| AulaError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            agent,
        })
    }

    /// Generate an embedding vector for a single text
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: EmbeddingInput::Single(text),
        };

        let body = self.post_json("embeddings", &request)?;
        parse_single_embedding(&body)
    }

    /// Generate embeddings for multiple texts in one request.
    ///
    /// Either returns exactly one vector per input or fails; a provider
    /// response with a different count is rejected rather than truncated.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: EmbeddingInput::Batch(texts),
        };

        let body = self.post_json("embeddings", &request)?;
        parse_batch_embeddings(&body, texts.len())
    }

    /// Run a chat completion over the assembled conversation.
    ///
    /// Returns `None` when the provider produced no usable message content;
    /// the caller decides on a fallback.
    #[inline]
    pub fn chat_completion(
        &self,
        messages: &[PromptMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Option<String>> {
        debug!(
            "Requesting chat completion with {} messages (max_tokens: {})",
            messages.len(),
            max_tokens
        );

        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature,
            max_tokens,
        };

        let body = self.post_json("chat/completions", &request)?;
        parse_chat_content(&body)
    }

    fn post_json<T: Serialize>(&self, path: &str, request: &T) -> Result<String> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AulaError::Provider(format!("Failed to build URL for {path}: {e}")))?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| AulaError::Provider(format!("Failed to serialize request: {e}")))?;

        let authorization = format!("Bearer {}", self.api_key);
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", authorization.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .map_err(|e| AulaError::Provider(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| AulaError::Provider(format!("Failed to read response from {url}: {e}")))?;

        if !status.is_success() {
            return Err(AulaError::Provider(format!(
                "{url} returned HTTP {status}: {text}"
            )));
        }

        Ok(text)
    }
}

fn parse_single_embedding(body: &str) -> Result<Vec<f32>> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| AulaError::Provider(format!("Malformed embedding response: {e}")))?;

    let first = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| AulaError::Provider("Embedding response contained no vectors".to_string()))?;

    if first.embedding.is_empty() {
        return Err(AulaError::Provider(
            "Embedding response contained an empty vector".to_string(),
        ));
    }

    Ok(first.embedding)
}

fn parse_batch_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| AulaError::Provider(format!("Malformed embedding response: {e}")))?;

    let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

    if vectors.len() != expected {
        return Err(AulaError::Provider(format!(
            "Expected {expected} embeddings, got {}",
            vectors.len()
        )));
    }

    Ok(vectors)
}

fn parse_chat_content(body: &str) -> Result<Option<String>> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AulaError::Provider(format!("Malformed chat completion response: {e}")))?;

    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.is_empty()))
}
