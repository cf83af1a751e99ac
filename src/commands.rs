use anyhow::{Context, anyhow};
use console::style;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::auth::{require_admin, resolve_user};
use crate::chat::ChatEngine;
use crate::config::Config;
use crate::database::sqlite::models::{
    AiConfigurationUpdate, CourseUpdate, NewCourse, NewExam, NewExamQuestion, NewUser,
    QuestionType, Role,
};
use crate::database::sqlite::queries::{
    AiConfigQueries, ChatMessageQueries, CourseQueries, ExamQueries, ProgressQueries,
    RagDocumentQueries, UserQueries,
};
use crate::database::{Database, VectorStore, collection_name};
use crate::exams;
use crate::ingestion::IngestionPipeline;
use crate::ingestion::extractor::TextExtractor;
use crate::openai::OpenAiClient;
use crate::storage::{BlobStorage, FileStorage};
use crate::{AulaError, Result};

fn load_config() -> Result<Config> {
    Ok(Config::load()?)
}

async fn open_database(config: &Config) -> Result<Database> {
    std::fs::create_dir_all(&config.base_dir).with_context(|| {
        format!("Failed to create data directory: {}", config.base_dir.display())
    })?;
    Ok(Database::new(config.database_path()).await?)
}

fn extractor_for(config: &Config) -> TextExtractor {
    TextExtractor::new(Duration::from_secs(config.openai.timeout_seconds))
}

async fn build_pipeline(config: &Config, database: Database) -> Result<IngestionPipeline> {
    let vector_store = VectorStore::new(config.vector_database_path()).await?;
    let client = OpenAiClient::new(&config.openai)?;

    Ok(IngestionPipeline::new(
        database,
        vector_store,
        client,
        extractor_for(config),
        config.chunking,
    ))
}

/// Create a user record
#[inline]
pub async fn add_user(name: Option<String>, email: Option<String>, admin: bool) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = UserQueries::create(
        database.pool(),
        NewUser {
            name,
            email,
            role: if admin { Role::Admin } else { Role::User },
        },
    )
    .await?;

    println!("Created user {} ({})", user.id, user.role);
    Ok(())
}

/// Create a new course owned by the acting admin
#[inline]
pub async fn add_course(
    user_id: i64,
    title: String,
    description: Option<String>,
    video_url: Option<String>,
    video_transcript: Option<String>,
    prerequisites: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    let course = CourseQueries::create(
        database.pool(),
        NewCourse {
            title,
            description,
            instructor_id: user.id,
            video_url,
            video_transcript,
            prerequisites,
        },
    )
    .await?;

    println!("Created course {} (ID: {})", course.title, course.id);
    println!("Courses start unpublished; run 'aula course publish {}' to go live.", course.id);
    Ok(())
}

/// List courses; published only unless `all` is set
#[inline]
pub async fn list_courses(all: bool) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let courses = if all {
        CourseQueries::list_all(database.pool()).await?
    } else {
        CourseQueries::list_published(database.pool()).await?
    };

    if courses.is_empty() {
        println!("No courses found.");
        return Ok(());
    }

    println!("Courses ({} total):", courses.len());
    for course in &courses {
        let status = if course.is_published {
            style("published").green()
        } else {
            style("draft").yellow()
        };
        println!("  {} [{}] {}", course.id, status, course.title);
        if let Some(description) = &course.description {
            println!("      {description}");
        }
    }

    Ok(())
}

/// Publish a course so students can see it
#[inline]
pub async fn publish_course(user_id: i64, course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    let course = CourseQueries::update(
        database.pool(),
        course_id,
        CourseUpdate {
            is_published: Some(true),
            ..CourseUpdate::default()
        },
    )
    .await?
    .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

    println!("Published course {} (ID: {})", course.title, course.id);
    Ok(())
}

/// Ingest a document into a course's vector collection.
///
/// `file` may be a URL or a local path; local files are staged through
/// blob storage first so the pipeline always reads by URL.
#[inline]
pub async fn ingest_document(
    user_id: i64,
    course_id: i64,
    title: String,
    file: String,
    mime_type: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&file).to_string());
    let file_url = resolve_file_url(&config, &file, &mime_type).await?;

    let pipeline = build_pipeline(&config, database).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Ingesting {title}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = pipeline
        .ingest(course_id, &title, &file_url, &mime_type)
        .await;
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "Ingested '{}' as document {} ({} chunks processed)",
        title, report.document_id, report.chunks_processed
    );
    Ok(())
}

/// List a course's ingested documents and the size of its collection
#[inline]
pub async fn list_documents(course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let documents = RagDocumentQueries::list_by_course(database.pool(), course_id).await?;

    if documents.is_empty() {
        println!("No documents ingested for course {course_id}.");
        return Ok(());
    }

    println!("Documents for course {} ({} total):", course_id, documents.len());
    for document in &documents {
        println!(
            "  {} {} ({}, {} characters)",
            document.id,
            document.title,
            document.mime_type.as_deref().unwrap_or("unknown type"),
            document.content.chars().count()
        );
    }

    let vector_store = VectorStore::new(config.vector_database_path()).await?;
    match vector_store.count(&collection_name(course_id)).await {
        Ok(count) => println!("Vector collection holds {count} chunks."),
        Err(e) => println!("Vector collection unavailable: {e}"),
    }

    Ok(())
}

/// Delete a document and its lead vector record
#[inline]
pub async fn delete_document(user_id: i64, id: i64, course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    let pipeline = build_pipeline(&config, database).await?;
    pipeline.delete_document(id, course_id).await?;

    println!("Deleted document {id}.");
    Ok(())
}

/// Run one chat turn against a course assistant
#[inline]
pub async fn chat_turn(user_id: i64, course_id: i64, message: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    resolve_user(&database, user_id).await?;

    let vector_store = VectorStore::new(config.vector_database_path()).await?;
    let client = OpenAiClient::new(&config.openai)?;
    let engine = ChatEngine::new(database, vector_store, client);

    let reply = engine.respond(user_id, course_id, &message).await?;
    println!("{reply}");
    Ok(())
}

/// Print the chat history for a (user, course) pair, oldest first
#[inline]
pub async fn show_history(user_id: i64, course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let history = ChatMessageQueries::history(database.pool(), user_id, course_id).await?;

    if history.is_empty() {
        println!("No chat history for user {user_id} in course {course_id}.");
        return Ok(());
    }

    for message in &history {
        let label = match message.role {
            crate::database::sqlite::models::ChatRole::User => style("user").cyan(),
            crate::database::sqlite::models::ChatRole::Assistant => style("assistant").green(),
        };
        println!("[{}] {}", label, message.content);
    }

    Ok(())
}

/// Show the stored AI configuration for a course
#[inline]
pub async fn show_ai_config(course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    match AiConfigQueries::get_by_course(database.pool(), course_id).await? {
        Some(ai_config) => {
            println!("AI configuration for course {course_id}:");
            println!("  Temperature: {}", ai_config.temperature);
            println!("  Max tokens: {}", ai_config.max_tokens);
            println!("  System prompt:\n{}", ai_config.system_prompt);
        }
        None => {
            println!("No AI configuration stored for course {course_id}; defaults apply.");
        }
    }

    Ok(())
}

/// Create or update a course's AI configuration
#[inline]
pub async fn set_ai_config(
    user_id: i64,
    course_id: i64,
    system_prompt: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    CourseQueries::get_by_id(database.pool(), course_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

    let update = AiConfigurationUpdate {
        system_prompt,
        temperature,
        max_tokens,
    };
    update.validate().map_err(AulaError::Config)?;

    let saved = AiConfigQueries::upsert(database.pool(), course_id, update).await?;

    println!(
        "Saved AI configuration for course {} (temperature {}, max tokens {}).",
        course_id, saved.temperature, saved.max_tokens
    );
    Ok(())
}

/// Create an exam for a course
#[inline]
pub async fn create_exam(
    user_id: i64,
    course_id: i64,
    title: String,
    description: Option<String>,
    passing_score: Option<f64>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    CourseQueries::get_by_id(database.pool(), course_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

    let exam = ExamQueries::create(
        database.pool(),
        NewExam {
            course_id,
            title,
            description,
            passing_score,
        },
    )
    .await?;

    println!(
        "Created exam {} (ID: {}, passing score {}).",
        exam.title, exam.id, exam.passing_score
    );
    Ok(())
}

/// Add a question to an exam
#[inline]
pub async fn add_exam_question(
    user_id: i64,
    exam_id: i64,
    question: String,
    question_type: String,
    options: Option<String>,
    correct_answer: Option<String>,
    points: i64,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let user = resolve_user(&database, user_id).await?;
    require_admin(&user)?;

    ExamQueries::get_by_id(database.pool(), exam_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("exam {exam_id} not found")))?;

    let question_type = parse_question_type(&question_type)?;

    let created = ExamQueries::add_question(
        database.pool(),
        NewExamQuestion {
            exam_id,
            question,
            question_type,
            options,
            correct_answer,
            points,
        },
    )
    .await?;

    println!("Added question {} to exam {}.", created.id, exam_id);
    Ok(())
}

/// Grade a submitted answer set and record the result
#[inline]
pub async fn grade_exam(user_id: i64, exam_id: i64, answers: Vec<String>) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    resolve_user(&database, user_id).await?;

    let exam = ExamQueries::get_by_id(database.pool(), exam_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("exam {exam_id} not found")))?;

    let questions = ExamQueries::questions(database.pool(), exam_id).await?;
    let answers = parse_answers(&answers)?;

    let result = exams::grade(&questions, &answers, exam.passing_score);

    match result.score {
        Some(score) => {
            ProgressQueries::record_exam_result(database.pool(), user_id, exam.course_id, score)
                .await?;

            let outcome = if result.passed == Some(true) {
                style("passed").green()
            } else {
                style("failed").red()
            };
            println!(
                "Score: {:.1}% ({}/{} correct) - {}",
                score, result.correct, result.total, outcome
            );
        }
        None => {
            println!("Exam {exam_id} has no questions to grade.");
        }
    }

    Ok(())
}

/// Record that a student watched the course video
#[inline]
pub async fn mark_video_watched(user_id: i64, course_id: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    resolve_user(&database, user_id).await?;
    CourseQueries::get_by_id(database.pool(), course_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("course {course_id} not found")))?;

    ProgressQueries::mark_video_watched(database.pool(), user_id, course_id).await?;
    println!("Recorded video watched for user {user_id} in course {course_id}.");
    Ok(())
}

/// Turn a local path into a staged file URL; pass URLs through untouched
async fn resolve_file_url(config: &Config, file: &str, mime_type: &str) -> Result<String> {
    if let Ok(url) = url::Url::parse(file) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            return Ok(url.to_string());
        }
    }

    let path = Path::new(file);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let key = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("cannot derive a storage key from {}", path.display()))?;

    let storage = FileStorage::new(config.files_path());
    let url = storage.put(key, &bytes, mime_type).await?;
    Ok(url.to_string())
}

fn parse_question_type(value: &str) -> Result<QuestionType> {
    match value {
        "multiple_choice" => Ok(QuestionType::MultipleChoice),
        "short_answer" => Ok(QuestionType::ShortAnswer),
        "essay" => Ok(QuestionType::Essay),
        other => Err(AulaError::Config(format!(
            "unknown question type '{other}' (expected multiple_choice, short_answer, or essay)"
        ))),
    }
}

/// Parse `question_id=answer` pairs from the command line
fn parse_answers(pairs: &[String]) -> Result<HashMap<i64, String>> {
    let mut answers = HashMap::with_capacity(pairs.len());

    for pair in pairs {
        let (id, answer) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid answer '{pair}' (expected question_id=answer)"))?;
        let id: i64 = id
            .trim()
            .parse()
            .with_context(|| format!("invalid question id in '{pair}'"))?;
        answers.insert(id, answer.trim().to_string());
    }

    Ok(answers)
}

fn guess_mime_type(file: &str) -> &'static str {
    let lower = file.to_ascii_lowercase();
    if lower.ends_with(".txt") {
        "text/plain"
    } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
        "text/markdown"
    } else if lower.ends_with(".html") || lower.ends_with(".htm") {
        "text/html"
    } else if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "application/octet-stream"
    }
}
