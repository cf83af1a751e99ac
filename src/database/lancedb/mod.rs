// LanceDB vector database module
// One collection per course, holding embedded document chunks

pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::VectorStore;

/// Metadata stored alongside each chunk vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorPayload {
    /// Logical id of the source document
    pub document_id: String,
    /// Course the chunk belongs to
    pub course_id: i64,
    /// Title of the source document
    pub title: String,
    /// The chunk text itself
    pub content: String,
    /// Position of this chunk within the document
    pub chunk_index: u32,
    pub mime_type: Option<String>,
}

/// One ranked result from a similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub vector_id: String,
    pub payload: VectorPayload,
    /// Similarity in [0, 1], higher is closer
    pub score: f32,
    pub distance: f32,
}

/// Name of a course's vector collection
#[inline]
pub fn collection_name(course_id: i64) -> String {
    format!("course-{course_id}")
}
