// Database access layer
// SQLite holds relational records; LanceDB holds the vector collections

pub mod lancedb;
pub mod sqlite;

pub use lancedb::{SearchHit, VectorPayload, VectorStore, collection_name};
pub use sqlite::Database;
