
use super::{SearchHit, VectorPayload};
use crate::AulaError;
use crate::openai::EMBEDDING_DIMENSION;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Vector database client backed by LanceDB, one table per collection
pub struct VectorStore {
    connection: Connection,
}

impl VectorStore {
    /// Open (or create) the vector database at the given directory
    #[inline]
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, AulaError> {
        let db_path = db_path.as_ref();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AulaError::VectorStore(format!("Failed to create vector database directory: {e}"))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AulaError::VectorStore(format!("Failed to connect to LanceDB: {e}")))?;

        Ok(Self { connection })
    }

    /// Create the collection if it does not exist yet. Safe to call for an
    /// existing collection.
    #[inline]
    pub async fn ensure_collection(&self, collection: &str) -> Result<(), AulaError> {
        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AulaError::VectorStore(format!("Failed to list collections: {e}")))?;

        if names.iter().any(|n| n == collection) {
            return Ok(());
        }

        info!("Creating vector collection: {}", collection);
        match self
            .connection
            .create_empty_table(collection, collection_schema())
            .execute()
            .await
        {
            Ok(_) => Ok(()),
            // A concurrent caller may have created it between the check and
            // the create; that still satisfies this call.
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(AulaError::VectorStore(format!(
                "Failed to create collection {collection}: {e}"
            ))),
        }
    }

    /// Insert or overwrite one vector record, returning its id
    #[inline]
    pub async fn upsert(
        &self,
        collection: &str,
        vector_id: &str,
        vector: &[f32],
        payload: &VectorPayload,
    ) -> Result<String, AulaError> {
        if vector.len() != EMBEDDING_DIMENSION {
            return Err(AulaError::VectorStore(format!(
                "Vector has {} dimensions, collection expects {}",
                vector.len(),
                EMBEDDING_DIMENSION
            )));
        }

        let table = self.open_table(collection).await?;

        // Overwrite semantics: remove any record with the same id first
        table
            .delete(&format!("id = '{}'", escape_literal(vector_id)))
            .await
            .map_err(|e| {
                AulaError::VectorStore(format!("Failed to replace record {vector_id}: {e}"))
            })?;

        let batch = build_record_batch(vector_id, vector, payload)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);

        table.add(reader).execute().await.map_err(|e| {
            AulaError::VectorStore(format!("Failed to insert record {vector_id}: {e}"))
        })?;

        debug!(
            "Upserted vector {} into {} (chunk {})",
            vector_id, collection, payload.chunk_index
        );
        Ok(vector_id.to_string())
    }

    /// Search a collection for the most similar records, best match first
    #[inline]
    pub async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, AulaError> {
        if query_vector.len() != EMBEDDING_DIMENSION {
            return Err(AulaError::VectorStore(format!(
                "Query vector has {} dimensions, collection expects {}",
                query_vector.len(),
                EMBEDDING_DIMENSION
            )));
        }

        debug!("Searching {} with limit {}", collection, limit);

        let table = self.open_table(collection).await?;
        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| AulaError::VectorStore(format!("Failed to build vector search: {e}")))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AulaError::VectorStore(format!("Failed to execute search: {e}")))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| AulaError::VectorStore(format!("Failed to read search results: {e}")))?
        {
            hits.extend(parse_search_batch(&batch)?);
        }

        debug!("Search over {} returned {} hits", collection, hits.len());
        Ok(hits)
    }

    /// Remove one record. Removing an id that is already absent succeeds.
    #[inline]
    pub async fn delete(&self, collection: &str, vector_id: &str) -> Result<(), AulaError> {
        let table = match self.try_open_table(collection).await? {
            Some(table) => table,
            None => return Ok(()),
        };

        table
            .delete(&format!("id = '{}'", escape_literal(vector_id)))
            .await
            .map_err(|e| {
                AulaError::VectorStore(format!("Failed to delete record {vector_id}: {e}"))
            })?;

        debug!("Deleted vector {} from {}", vector_id, collection);
        Ok(())
    }

    /// Drop and recreate a collection, leaving it empty
    #[inline]
    pub async fn clear(&self, collection: &str) -> Result<(), AulaError> {
        if self.try_open_table(collection).await?.is_some() {
            self.connection.drop_table(collection).await.map_err(|e| {
                AulaError::VectorStore(format!("Failed to drop collection {collection}: {e}"))
            })?;
        }

        self.ensure_collection(collection).await
    }

    /// Number of records in a collection
    #[inline]
    pub async fn count(&self, collection: &str) -> Result<u64, AulaError> {
        let table = self.open_table(collection).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| AulaError::VectorStore(format!("Failed to count records: {e}")))?;

        Ok(count as u64)
    }

    async fn open_table(&self, collection: &str) -> Result<Table, AulaError> {
        self.connection
            .open_table(collection)
            .execute()
            .await
            .map_err(|e| {
                AulaError::VectorStore(format!("Failed to open collection {collection}: {e}"))
            })
    }

    async fn try_open_table(&self, collection: &str) -> Result<Option<Table>, AulaError> {
        match self.connection.open_table(collection).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(AulaError::VectorStore(format!(
                "Failed to open collection {collection}: {e}"
            ))),
        }
    }
}

/// Schema shared by all course collections; the vector width is fixed at
/// collection creation and must match every inserted embedding
fn collection_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                EMBEDDING_DIMENSION as i32,
            ),
            false,
        ),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("course_id", DataType::Int64, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("mime_type", DataType::Utf8, true),
    ]))
}

fn build_record_batch(
    vector_id: &str,
    vector: &[f32],
    payload: &VectorPayload,
) -> Result<RecordBatch, AulaError> {
    let values = Float32Array::from(vector.to_vec());
    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array = FixedSizeListArray::try_new(
        item_field,
        EMBEDDING_DIMENSION as i32,
        Arc::new(values),
        None,
    )
    .map_err(|e| AulaError::VectorStore(format!("Failed to build vector array: {e}")))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(vec![vector_id])),
        Arc::new(vector_array),
        Arc::new(StringArray::from(vec![payload.document_id.as_str()])),
        Arc::new(Int64Array::from(vec![payload.course_id])),
        Arc::new(StringArray::from(vec![payload.title.as_str()])),
        Arc::new(StringArray::from(vec![payload.content.as_str()])),
        Arc::new(UInt32Array::from(vec![payload.chunk_index])),
        Arc::new(StringArray::from(vec![payload.mime_type.as_deref()])),
    ];

    RecordBatch::try_new(collection_schema(), arrays)
        .map_err(|e| AulaError::VectorStore(format!("Failed to build record batch: {e}")))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>, AulaError> {
    let ids = string_column(batch, "id")?;
    let document_ids = string_column(batch, "document_id")?;
    let titles = string_column(batch, "title")?;
    let contents = string_column(batch, "content")?;
    let mime_types = string_column(batch, "mime_type")?;

    let course_ids = batch
        .column_by_name("course_id")
        .and_then(|col| col.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| AulaError::VectorStore("Missing course_id column".to_string()))?;
    let chunk_indices = batch
        .column_by_name("chunk_index")
        .and_then(|col| col.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| AulaError::VectorStore("Missing chunk_index column".to_string()))?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut hits = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        hits.push(SearchHit {
            vector_id: ids.value(row).to_string(),
            payload: VectorPayload {
                document_id: document_ids.value(row).to_string(),
                course_id: course_ids.value(row),
                title: titles.value(row).to_string(),
                content: contents.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                mime_type: if mime_types.is_null(row) {
                    None
                } else {
                    Some(mime_types.value(row).to_string())
                },
            },
            // Cosine distance in [0, 2] maps to similarity, higher is closer
            score: 1.0 - distance,
            distance,
        });
    }

    Ok(hits)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, AulaError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AulaError::VectorStore(format!("Missing {name} column")))
}

/// Single quotes doubled for use inside a SQL string literal
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
