use super::*;
use crate::config::OpenAiConfig;
use crate::database::sqlite::models::{NewCourse, NewUser, Role};
use crate::database::sqlite::queries::UserQueries;
use std::io::Write;
use tempfile::TempDir;
use url::Url;

struct Fixture {
    _dir: TempDir,
    pipeline: IngestionPipeline,
    database: Database,
    course_id: i64,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::new(dir.path().join("metadata.db"))
        .await
        .expect("Failed to create database");
    let vector_store = VectorStore::new(dir.path().join("vectors"))
        .await
        .expect("Failed to create vector store");

    let client = OpenAiClient::new(&OpenAiConfig {
        api_key: Some("test-key".to_string()),
        ..OpenAiConfig::default()
    })
    .expect("Failed to create client");

    let instructor = UserQueries::create(
        database.pool(),
        NewUser {
            name: Some("Prof. Chen".to_string()),
            email: None,
            role: Role::Admin,
        },
    )
    .await
    .expect("Failed to create instructor");

    let course = CourseQueries::create(
        database.pool(),
        NewCourse {
            title: "Chemistry 101".to_string(),
            description: None,
            instructor_id: instructor.id,
            video_url: None,
            video_transcript: None,
            prerequisites: None,
        },
    )
    .await
    .expect("Failed to create course");

    let pipeline = IngestionPipeline::new(
        database.clone(),
        vector_store,
        client,
        TextExtractor::default(),
        ChunkingConfig::default(),
    );

    Fixture {
        _dir: dir,
        pipeline,
        database,
        course_id: course.id,
    }
}

fn temp_text_file(content: &str) -> (tempfile::NamedTempFile, String) {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    let url = Url::from_file_path(file.path())
        .expect("temp path should be absolute")
        .to_string();
    (file, url)
}

#[tokio::test]
async fn empty_document_is_rejected_without_a_record() {
    let fixture = fixture().await;
    let (_file, url) = temp_text_file("");

    let result = fixture
        .pipeline
        .ingest(fixture.course_id, "Empty", &url, "text/plain")
        .await;

    assert!(matches!(result, Err(AulaError::Ingestion(_))));
    assert!(
        RagDocumentQueries::list_by_course(fixture.database.pool(), fixture.course_id)
            .await
            .expect("list should succeed")
            .is_empty()
    );
}

#[tokio::test]
async fn whitespace_only_document_is_rejected() {
    let fixture = fixture().await;
    let (_file, url) = temp_text_file(&" \n \n ".repeat(400));

    let result = fixture
        .pipeline
        .ingest(fixture.course_id, "Blank", &url, "text/plain")
        .await;

    assert!(matches!(result, Err(AulaError::Ingestion(_))));
}

#[tokio::test]
async fn unknown_course_is_rejected_before_extraction() {
    let fixture = fixture().await;
    let (_file, url) = temp_text_file("some content");

    let result = fixture
        .pipeline
        .ingest(9999, "Orphan", &url, "text/plain")
        .await;

    assert!(matches!(result, Err(AulaError::NotFound(_))));
}

#[tokio::test]
async fn unsupported_media_type_aborts_ingestion() {
    let fixture = fixture().await;

    let result = fixture
        .pipeline
        .ingest(
            fixture.course_id,
            "Slides",
            "file:///tmp/slides.bin",
            "application/pdf",
        )
        .await;

    assert!(matches!(result, Err(AulaError::Extraction(_))));
    assert!(
        RagDocumentQueries::list_by_course(fixture.database.pool(), fixture.course_id)
            .await
            .expect("list should succeed")
            .is_empty()
    );
}

#[tokio::test]
async fn delete_missing_document_is_not_found() {
    let fixture = fixture().await;

    let result = fixture.pipeline.delete_document(123, fixture.course_id).await;

    assert!(matches!(result, Err(AulaError::NotFound(_))));
}
