use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn creates_database_and_schema() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::new(dir.path().join("metadata.db"))
        .await
        .expect("Failed to create database");

    // Schema application is idempotent
    database
        .init_schema()
        .await
        .expect("Reapplying schema should succeed");

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(database.pool())
    .await
    .expect("Failed to list tables");

    let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
    for expected in [
        "ai_configurations",
        "chat_messages",
        "courses",
        "exam_questions",
        "exams",
        "rag_documents",
        "student_progress",
        "users",
    ] {
        assert!(names.contains(&expected), "missing table {expected}");
    }
}

#[tokio::test]
async fn optimize_succeeds_on_fresh_database() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::new(dir.path().join("metadata.db"))
        .await
        .expect("Failed to create database");

    database.optimize().await.expect("optimize should succeed");
}
