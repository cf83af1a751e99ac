// Retrieval-augmented chat
// Each turn merges stored configuration, retrieved context, and history
// into a single model call


use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::database::sqlite::models::{
    AiConfiguration, ChatMessage, ChatRole, Course, NewChatMessage, RagDocument,
};
use crate::database::sqlite::queries::{
    AiConfigQueries, ChatMessageQueries, CourseQueries, RagDocumentQueries,
};
use crate::database::{Database, VectorStore, collection_name};
use crate::openai::{OpenAiClient, PromptMessage, PromptRole};
use crate::{AulaError, Result};

/// How many chunks similarity search returns
const RETRIEVAL_LIMIT: usize = 5;
/// How many of the best-ranked chunks go into the prompt
const CONTEXT_CHUNKS: usize = 3;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const FALLBACK_REPLY: &str = "I couldn't generate a response.";

/// Answers course questions with retrieval-augmented model calls.
///
/// All collaborators are injected; the engine holds no global state.
pub struct ChatEngine {
    database: Database,
    vector_store: VectorStore,
    client: OpenAiClient,
}

impl ChatEngine {
    #[inline]
    pub fn new(database: Database, vector_store: VectorStore, client: OpenAiClient) -> Self {
        Self {
            database,
            vector_store,
            client,
        }
    }

    /// Handle one user chat turn and return the assistant's reply.
    ///
    /// The user's message is persisted before anything else, so a failed
    /// turn still leaves the question in history. Retrieval failures
    /// degrade to an empty context instead of failing the turn.
    #[inline]
    pub async fn respond(&self, user_id: i64, course_id: i64, message: &str) -> Result<String> {
        let pool = self.database.pool();

        ChatMessageQueries::create(
            pool,
            NewChatMessage {
                user_id,
                course_id,
                role: ChatRole::User,
                content: message.to_string(),
            },
        )
        .await?;

        let course = CourseQueries::get_by_id(pool, course_id)
            .await?
            .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

        let config = AiConfigQueries::get_by_course(pool, course_id).await?;

        let context = match self.retrieve_context(course_id, message).await {
            Ok(chunks) => chunks,
            Err(e) => {
                // A retrieval failure must not fail the turn
                warn!("Context retrieval failed for course {}: {}", course_id, e);
                Vec::new()
            }
        };

        let documents = RagDocumentQueries::list_by_course(pool, course_id).await?;
        let system_prompt = build_system_prompt(&course, config.as_ref(), &context, &documents);

        // History was appended to above, so it already ends with the new
        // user message
        let history = ChatMessageQueries::history(pool, user_id, course_id).await?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(PromptMessage::new(PromptRole::System, system_prompt));
        messages.extend(history.iter().map(prompt_message));

        let (temperature, max_tokens) = config.as_ref().map_or(
            (DEFAULT_TEMPERATURE, DEFAULT_MAX_TOKENS),
            |c| {
                (
                    c.temperature,
                    u32::try_from(c.max_tokens).unwrap_or(DEFAULT_MAX_TOKENS),
                )
            },
        );

        debug!(
            "Chat turn for user {} in course {}: {} history messages, {} context chunks",
            user_id,
            course_id,
            history.len(),
            context.len()
        );

        let reply = self
            .client
            .chat_completion(&messages, temperature, max_tokens)?
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        ChatMessageQueries::create(
            pool,
            NewChatMessage {
                user_id,
                course_id,
                role: ChatRole::Assistant,
                content: reply.clone(),
            },
        )
        .await?;

        info!("Completed chat turn for user {} in course {}", user_id, course_id);
        Ok(reply)
    }

    /// Best-effort similarity retrieval for one query. Callers map the
    /// error branch to an empty context.
    async fn retrieve_context(&self, course_id: i64, query: &str) -> Result<Vec<String>> {
        let collection = collection_name(course_id);

        self.vector_store.ensure_collection(&collection).await?;
        let query_vector = self.client.embed(query)?;
        let hits = self
            .vector_store
            .search(&collection, &query_vector, RETRIEVAL_LIMIT)
            .await?;

        Ok(hits
            .into_iter()
            .take(CONTEXT_CHUNKS)
            .map(|hit| hit.payload.content)
            .collect())
    }
}

fn prompt_message(message: &ChatMessage) -> PromptMessage {
    let role = match message.role {
        ChatRole::User => PromptRole::User,
        ChatRole::Assistant => PromptRole::Assistant,
    };
    PromptMessage::new(role, message.content.clone())
}

/// Assemble the system prompt from configuration, retrieved context, and
/// the course's document list
fn build_system_prompt(
    course: &Course,
    config: Option<&AiConfiguration>,
    context: &[String],
    documents: &[RagDocument],
) -> String {
    let mut prompt = match config {
        Some(config) => config.system_prompt.clone(),
        None => format!(
            "You are a helpful AI assistant for the course \"{}\".\n\
             Course description: {}\n\
             Course transcript: {}\n\
             Help students understand the course content and answer their \
             questions based on the provided materials.",
            course.title,
            course.description.as_deref().unwrap_or("No description"),
            course.video_transcript.as_deref().unwrap_or("No transcript"),
        ),
    };

    if !context.is_empty() {
        prompt.push_str("\n\nRelevant course material:\n");
        for (index, chunk) in context.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n", index + 1, chunk));
        }
    }

    prompt.push_str("\n\nAvailable documents: ");
    if documents.is_empty() {
        prompt.push_str("No documents");
    } else {
        let titles = documents.iter().map(|doc| doc.title.as_str()).join(", ");
        prompt.push_str(&titles);
    }

    prompt
}
