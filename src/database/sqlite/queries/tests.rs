use super::*;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{ChatRole, QuestionType, Role};
use tempfile::TempDir;

async fn test_database() -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::new(dir.path().join("metadata.db"))
        .await
        .expect("Failed to create database");
    (dir, database)
}

async fn seed_course(database: &Database) -> Course {
    let instructor = UserQueries::create(
        database.pool(),
        NewUser {
            name: Some("Prof. Rivera".to_string()),
            email: Some("rivera@example.com".to_string()),
            role: Role::Admin,
        },
    )
    .await
    .expect("Failed to create instructor");

    CourseQueries::create(
        database.pool(),
        NewCourse {
            title: "Intro to Biology".to_string(),
            description: Some("Cells and systems".to_string()),
            instructor_id: instructor.id,
            video_url: None,
            video_transcript: Some("Today we cover cells.".to_string()),
            prerequisites: None,
        },
    )
    .await
    .expect("Failed to create course")
}

#[tokio::test]
async fn course_create_and_publish() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    assert!(!course.is_published);
    assert!(
        CourseQueries::list_published(database.pool())
            .await
            .expect("list should succeed")
            .is_empty()
    );

    let updated = CourseQueries::update(
        database.pool(),
        course.id,
        CourseUpdate {
            is_published: Some(true),
            ..CourseUpdate::default()
        },
    )
    .await
    .expect("update should succeed")
    .expect("course should exist");

    assert!(updated.is_published);
    assert_eq!(updated.title, "Intro to Biology");
    assert_eq!(
        CourseQueries::list_published(database.pool())
            .await
            .expect("list should succeed")
            .len(),
        1
    );
}

#[tokio::test]
async fn course_update_preserves_unset_fields() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    let updated = CourseQueries::update(
        database.pool(),
        course.id,
        CourseUpdate {
            description: Some("Revised description".to_string()),
            ..CourseUpdate::default()
        },
    )
    .await
    .expect("update should succeed")
    .expect("course should exist");

    assert_eq!(updated.description.as_deref(), Some("Revised description"));
    assert_eq!(
        updated.video_transcript.as_deref(),
        Some("Today we cover cells.")
    );
}

#[tokio::test]
async fn document_roundtrip_and_delete() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    let document = RagDocumentQueries::create(
        database.pool(),
        NewRagDocument {
            course_id: course.id,
            document_id: "doc-1".to_string(),
            title: "Syllabus".to_string(),
            content: "Week one\nWeek two".to_string(),
            vector_id: Some("vec-1".to_string()),
            mime_type: Some("text/plain".to_string()),
            file_url: Some("file:///tmp/syllabus.txt".to_string()),
        },
    )
    .await
    .expect("create should succeed");

    let listed = RagDocumentQueries::list_by_course(database.pool(), course.id)
        .await
        .expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "Week one\nWeek two");
    assert_eq!(listed[0].vector_id.as_deref(), Some("vec-1"));

    assert!(
        RagDocumentQueries::delete(database.pool(), document.id)
            .await
            .expect("delete should succeed")
    );
    assert!(
        !RagDocumentQueries::delete(database.pool(), document.id)
            .await
            .expect("second delete should succeed")
    );
    assert!(
        RagDocumentQueries::list_by_course(database.pool(), course.id)
            .await
            .expect("list should succeed")
            .is_empty()
    );
}

#[tokio::test]
async fn chat_history_is_ordered_oldest_first() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    for (role, content) in [
        (ChatRole::User, "What is a cell?"),
        (ChatRole::Assistant, "The basic unit of life."),
        (ChatRole::User, "And a membrane?"),
        (ChatRole::Assistant, "Its outer boundary."),
    ] {
        ChatMessageQueries::create(
            database.pool(),
            NewChatMessage {
                user_id: 7,
                course_id: course.id,
                role,
                content: content.to_string(),
            },
        )
        .await
        .expect("create should succeed");
    }

    let history = ChatMessageQueries::history(database.pool(), 7, course.id)
        .await
        .expect("history should succeed");

    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[0].content, "What is a cell?");
    assert_eq!(history[1].role, ChatRole::Assistant);
    assert_eq!(history[2].role, ChatRole::User);
    assert_eq!(history[3].role, ChatRole::Assistant);
    assert_eq!(history[3].content, "Its outer boundary.");
}

#[tokio::test]
async fn chat_history_is_scoped_to_user_and_course() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    ChatMessageQueries::create(
        database.pool(),
        NewChatMessage {
            user_id: 1,
            course_id: course.id,
            role: ChatRole::User,
            content: "mine".to_string(),
        },
    )
    .await
    .expect("create should succeed");
    ChatMessageQueries::create(
        database.pool(),
        NewChatMessage {
            user_id: 2,
            course_id: course.id,
            role: ChatRole::User,
            content: "someone else's".to_string(),
        },
    )
    .await
    .expect("create should succeed");

    let history = ChatMessageQueries::history(database.pool(), 1, course.id)
        .await
        .expect("history should succeed");

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "mine");
}

#[tokio::test]
async fn ai_config_first_save_applies_defaults() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    let config = AiConfigQueries::upsert(
        database.pool(),
        course.id,
        AiConfigurationUpdate::default(),
    )
    .await
    .expect("upsert should succeed");

    assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    assert!((config.temperature - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.max_tokens, 2000);
}

#[tokio::test]
async fn ai_config_upsert_updates_single_row() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    AiConfigQueries::upsert(
        database.pool(),
        course.id,
        AiConfigurationUpdate {
            system_prompt: Some("Answer in Spanish.".to_string()),
            temperature: Some(0.3),
            max_tokens: Some(1500),
        },
    )
    .await
    .expect("first upsert should succeed");

    let second = AiConfigQueries::upsert(
        database.pool(),
        course.id,
        AiConfigurationUpdate {
            temperature: Some(1.1),
            ..AiConfigurationUpdate::default()
        },
    )
    .await
    .expect("second upsert should succeed");

    // Partial update keeps earlier fields
    assert_eq!(second.system_prompt, "Answer in Spanish.");
    assert!((second.temperature - 1.1).abs() < f64::EPSILON);
    assert_eq!(second.max_tokens, 1500);

    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ai_configurations WHERE course_id = ?")
            .bind(course.id)
            .fetch_one(database.pool())
            .await
            .expect("count should succeed");
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn exam_with_questions() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    let exam = ExamQueries::create(
        database.pool(),
        NewExam {
            course_id: course.id,
            title: "Midterm".to_string(),
            description: None,
            passing_score: None,
        },
    )
    .await
    .expect("create should succeed");

    assert!((exam.passing_score - 70.0).abs() < f64::EPSILON);

    ExamQueries::add_question(
        database.pool(),
        NewExamQuestion {
            exam_id: exam.id,
            question: "What organelle produces energy?".to_string(),
            question_type: QuestionType::MultipleChoice,
            options: Some(r#"["Mitochondria","Nucleus"]"#.to_string()),
            correct_answer: Some("Mitochondria".to_string()),
            points: 1,
        },
    )
    .await
    .expect("add question should succeed");

    let questions = ExamQueries::questions(database.pool(), exam.id)
        .await
        .expect("questions should succeed");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_type, QuestionType::MultipleChoice);

    let found = ExamQueries::get_by_course(database.pool(), course.id)
        .await
        .expect("get should succeed")
        .expect("exam should exist");
    assert_eq!(found.id, exam.id);
}

#[tokio::test]
async fn progress_enroll_is_idempotent_and_records_exam() {
    let (_dir, database) = test_database().await;
    let course = seed_course(&database).await;

    let first = ProgressQueries::enroll(database.pool(), 9, course.id)
        .await
        .expect("enroll should succeed");
    let second = ProgressQueries::enroll(database.pool(), 9, course.id)
        .await
        .expect("re-enroll should succeed");
    assert_eq!(first.id, second.id);

    let progress = ProgressQueries::record_exam_result(database.pool(), 9, course.id, 85.0)
        .await
        .expect("record should succeed");

    assert!(progress.exam_taken);
    assert_eq!(progress.exam_score, Some(85.0));

    let progress = ProgressQueries::mark_video_watched(database.pool(), 9, course.id)
        .await
        .expect("mark should succeed");
    assert!(progress.video_watched);
    assert_eq!(progress.exam_score, Some(85.0));
}
