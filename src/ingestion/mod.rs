// Document ingestion pipeline
// Extract -> chunk -> embed -> vector store, then persist the document record

#[cfg(test)]
mod tests;

pub mod chunking;
pub mod extractor;

use tracing::{debug, info};
use uuid::Uuid;

use crate::database::sqlite::models::NewRagDocument;
use crate::database::sqlite::queries::{CourseQueries, RagDocumentQueries};
use crate::database::{Database, VectorPayload, VectorStore, collection_name};
use crate::openai::OpenAiClient;
use crate::{AulaError, Result};
use chunking::{ChunkingConfig, chunk_with_config};
use extractor::TextExtractor;

pub use chunking::chunk_text;

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub document_id: i64,
    pub chunks_processed: usize,
}

/// Orchestrates one document's journey into the vector store.
///
/// Clients are injected at construction; the pipeline holds no global
/// state. Chunks are embedded and upserted strictly in document order, so
/// `chunk_index` always reflects the original chunk sequence.
pub struct IngestionPipeline {
    database: Database,
    vector_store: VectorStore,
    client: OpenAiClient,
    extractor: TextExtractor,
    chunking: ChunkingConfig,
}

impl IngestionPipeline {
    #[inline]
    pub fn new(
        database: Database,
        vector_store: VectorStore,
        client: OpenAiClient,
        extractor: TextExtractor,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            database,
            vector_store,
            client,
            extractor,
            chunking,
        }
    }

    /// Ingest one uploaded document for a course.
    ///
    /// Any failing step aborts the ingestion. Vector records upserted
    /// before a later failure are not rolled back; the document record is
    /// only written after every chunk has been stored.
    #[inline]
    pub async fn ingest(
        &self,
        course_id: i64,
        title: &str,
        file_url: &str,
        mime_type: &str,
    ) -> Result<IngestionReport> {
        info!("Ingesting '{}' for course {}", title, course_id);

        CourseQueries::get_by_id(self.database.pool(), course_id)
            .await?
            .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

        let text = self.extractor.extract(file_url, mime_type)?;
        let chunks = chunk_with_config(&text, &self.chunking);
        debug!("Document '{}' produced {} chunks", title, chunks.len());

        let collection = collection_name(course_id);
        self.vector_store.ensure_collection(&collection).await?;

        let document_id = Uuid::new_v4().to_string();
        let mut first_vector_id: Option<String> = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let vector = self.client.embed(chunk)?;
            let vector_id = Uuid::new_v4().simple().to_string();
            let payload = VectorPayload {
                document_id: document_id.clone(),
                course_id,
                title: title.to_string(),
                content: chunk.clone(),
                chunk_index: u32::try_from(index).unwrap_or(u32::MAX),
                mime_type: Some(mime_type.to_string()),
            };

            let stored_id = self
                .vector_store
                .upsert(&collection, &vector_id, &vector, &payload)
                .await?;

            if first_vector_id.is_none() {
                first_vector_id = Some(stored_id);
            }
        }

        let Some(first_vector_id) = first_vector_id else {
            return Err(AulaError::Ingestion(format!(
                "document '{title}' produced no chunks"
            )));
        };
        if first_vector_id.trim().is_empty() {
            return Err(AulaError::Ingestion(
                "vector store returned a blank record id".to_string(),
            ));
        }

        let document = RagDocumentQueries::create(
            self.database.pool(),
            NewRagDocument {
                course_id,
                document_id,
                title: title.to_string(),
                content: chunks.join("\n"),
                vector_id: Some(first_vector_id),
                mime_type: Some(mime_type.to_string()),
                file_url: Some(file_url.to_string()),
            },
        )
        .await?;

        info!(
            "Ingested '{}' as document {} ({} chunks)",
            title,
            document.id,
            chunks.len()
        );

        Ok(IngestionReport {
            document_id: document.id,
            chunks_processed: chunks.len(),
        })
    }

    /// Remove a document and its first-chunk vector record.
    ///
    /// Remaining chunk vectors carry the same document id in their payload
    /// but are only reachable through similarity search.
    #[inline]
    pub async fn delete_document(&self, id: i64, course_id: i64) -> Result<()> {
        let document = RagDocumentQueries::get_by_id(self.database.pool(), id)
            .await?
            .filter(|doc| doc.course_id == course_id)
            .ok_or_else(|| {
                AulaError::NotFound(format!("document {id} not found for course {course_id}"))
            })?;

        if let Some(vector_id) = &document.vector_id {
            self.vector_store
                .delete(&collection_name(course_id), vector_id)
                .await?;
        }

        RagDocumentQueries::delete(self.database.pool(), id).await?;

        info!("Deleted document {} from course {}", id, course_id);
        Ok(())
    }
}
