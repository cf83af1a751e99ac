#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{
    AiConfiguration, AiConfigurationUpdate, ChatMessage, Course, CourseUpdate, Exam, ExamQuestion,
    NewChatMessage, NewCourse, NewExam, NewExamQuestion, NewRagDocument, NewUser, RagDocument,
    StudentProgress, User,
};

/// System prompt stored when a configuration is first saved without one
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful course assistant.";

pub struct UserQueries;

impl UserQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_user: NewUser) -> Result<User> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO users (name, email, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(new_user.role)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .context("Failed to retrieve created user")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")
    }
}

pub struct CourseQueries;

impl CourseQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_course: NewCourse) -> Result<Course> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO courses (title, description, instructor_id, video_url, \
             video_transcript, prerequisites, is_published, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&new_course.title)
        .bind(&new_course.description)
        .bind(new_course.instructor_id)
        .bind(&new_course.video_url)
        .bind(&new_course.video_transcript)
        .bind(&new_course.prerequisites)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create course")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .context("Failed to retrieve created course")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor_id, video_url, video_transcript, \
             prerequisites, is_published, created_at, updated_at \
             FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get course by id")
    }

    #[inline]
    pub async fn list_published(pool: &SqlitePool) -> Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor_id, video_url, video_transcript, \
             prerequisites, is_published, created_at, updated_at \
             FROM courses WHERE is_published = 1 ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list published courses")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor_id, video_url, video_transcript, \
             prerequisites, is_published, created_at, updated_at \
             FROM courses ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list courses")
    }

    #[inline]
    pub async fn list_by_instructor(pool: &SqlitePool, instructor_id: i64) -> Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor_id, video_url, video_transcript, \
             prerequisites, is_published, created_at, updated_at \
             FROM courses WHERE instructor_id = ? ORDER BY created_at DESC",
        )
        .bind(instructor_id)
        .fetch_all(pool)
        .await
        .context("Failed to list courses by instructor")
    }

    #[inline]
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        update: CourseUpdate,
    ) -> Result<Option<Course>> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "UPDATE courses SET \
             title = COALESCE(?2, title), \
             description = COALESCE(?3, description), \
             video_url = COALESCE(?4, video_url), \
             video_transcript = COALESCE(?5, video_transcript), \
             prerequisites = COALESCE(?6, prerequisites), \
             is_published = COALESCE(?7, is_published), \
             updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.video_url)
        .bind(&update.video_transcript)
        .bind(&update.prerequisites)
        .bind(update.is_published)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to update course")?;

        Self::get_by_id(pool, id).await
    }
}

pub struct RagDocumentQueries;

impl RagDocumentQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_document: NewRagDocument) -> Result<RagDocument> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO rag_documents (course_id, document_id, title, content, vector_id, \
             mime_type, file_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_document.course_id)
        .bind(&new_document.document_id)
        .bind(&new_document.title)
        .bind(&new_document.content)
        .bind(&new_document.vector_id)
        .bind(&new_document.mime_type)
        .bind(&new_document.file_url)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create document record")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .context("Failed to retrieve created document")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<RagDocument>> {
        sqlx::query_as::<_, RagDocument>(
            "SELECT id, course_id, document_id, title, content, vector_id, mime_type, \
             file_url, created_at \
             FROM rag_documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by id")
    }

    #[inline]
    pub async fn list_by_course(pool: &SqlitePool, course_id: i64) -> Result<Vec<RagDocument>> {
        sqlx::query_as::<_, RagDocument>(
            "SELECT id, course_id, document_id, title, content, vector_id, mime_type, \
             file_url, created_at \
             FROM rag_documents WHERE course_id = ? ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
        .context("Failed to list documents for course")
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM rag_documents WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete document")?
            .rows_affected();

        Ok(affected > 0)
    }
}

pub struct ChatMessageQueries;

impl ChatMessageQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_message: NewChatMessage) -> Result<ChatMessage> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO chat_messages (user_id, course_id, role, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_message.user_id)
        .bind(new_message.course_id)
        .bind(new_message.role)
        .bind(&new_message.content)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to store chat message")?
        .last_insert_rowid();

        debug!("Stored {} message {} for user {}", new_message.role, id, new_message.user_id);

        sqlx::query_as::<_, ChatMessage>(
            "SELECT id, user_id, course_id, role, content, created_at \
             FROM chat_messages WHERE id = ?",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to retrieve stored chat message")
    }

    /// Full history for a (user, course) pair, oldest first
    #[inline]
    pub async fn history(
        pool: &SqlitePool,
        user_id: i64,
        course_id: i64,
    ) -> Result<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT id, user_id, course_id, role, content, created_at \
             FROM chat_messages WHERE user_id = ? AND course_id = ? \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(pool)
        .await
        .context("Failed to load chat history")
    }
}

pub struct AiConfigQueries;

impl AiConfigQueries {
    #[inline]
    pub async fn get_by_course(
        pool: &SqlitePool,
        course_id: i64,
    ) -> Result<Option<AiConfiguration>> {
        sqlx::query_as::<_, AiConfiguration>(
            "SELECT id, course_id, system_prompt, temperature, max_tokens, created_at, \
             updated_at \
             FROM ai_configurations WHERE course_id = ?",
        )
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get AI configuration")
    }

    /// Insert or update the configuration for a course in one statement.
    /// `course_id` is unique, so concurrent saves cannot produce two rows.
    #[inline]
    pub async fn upsert(
        pool: &SqlitePool,
        course_id: i64,
        update: AiConfigurationUpdate,
    ) -> Result<AiConfiguration> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO ai_configurations \
             (course_id, system_prompt, temperature, max_tokens, created_at, updated_at) \
             VALUES (?1, COALESCE(?2, ?6), COALESCE(?3, 0.7), COALESCE(?4, 2000), ?5, ?5) \
             ON CONFLICT(course_id) DO UPDATE SET \
             system_prompt = COALESCE(?2, system_prompt), \
             temperature = COALESCE(?3, temperature), \
             max_tokens = COALESCE(?4, max_tokens), \
             updated_at = ?5",
        )
        .bind(course_id)
        .bind(&update.system_prompt)
        .bind(update.temperature)
        .bind(update.max_tokens)
        .bind(now)
        .bind(DEFAULT_SYSTEM_PROMPT)
        .execute(pool)
        .await
        .context("Failed to save AI configuration")?;

        Self::get_by_course(pool, course_id)
            .await?
            .context("Failed to retrieve saved AI configuration")
    }
}

pub struct ExamQueries;

impl ExamQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_exam: NewExam) -> Result<Exam> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO exams (course_id, title, description, passing_score, created_at) \
             VALUES (?, ?, ?, COALESCE(?, 70.0), ?)",
        )
        .bind(new_exam.course_id)
        .bind(&new_exam.title)
        .bind(&new_exam.description)
        .bind(new_exam.passing_score)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create exam")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .context("Failed to retrieve created exam")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Exam>> {
        sqlx::query_as::<_, Exam>(
            "SELECT id, course_id, title, description, passing_score, created_at \
             FROM exams WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get exam by id")
    }

    #[inline]
    pub async fn get_by_course(pool: &SqlitePool, course_id: i64) -> Result<Option<Exam>> {
        sqlx::query_as::<_, Exam>(
            "SELECT id, course_id, title, description, passing_score, created_at \
             FROM exams WHERE course_id = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get exam for course")
    }

    #[inline]
    pub async fn add_question(
        pool: &SqlitePool,
        new_question: NewExamQuestion,
    ) -> Result<ExamQuestion> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO exam_questions \
             (exam_id, question, question_type, options, correct_answer, points, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_question.exam_id)
        .bind(&new_question.question)
        .bind(new_question.question_type)
        .bind(&new_question.options)
        .bind(&new_question.correct_answer)
        .bind(new_question.points)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to add exam question")?
        .last_insert_rowid();

        sqlx::query_as::<_, ExamQuestion>(
            "SELECT id, exam_id, question, question_type, options, correct_answer, points, \
             created_at \
             FROM exam_questions WHERE id = ?",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to retrieve created exam question")
    }

    #[inline]
    pub async fn questions(pool: &SqlitePool, exam_id: i64) -> Result<Vec<ExamQuestion>> {
        sqlx::query_as::<_, ExamQuestion>(
            "SELECT id, exam_id, question, question_type, options, correct_answer, points, \
             created_at \
             FROM exam_questions WHERE exam_id = ? ORDER BY id ASC",
        )
        .bind(exam_id)
        .fetch_all(pool)
        .await
        .context("Failed to list exam questions")
    }
}

pub struct ProgressQueries;

impl ProgressQueries {
    #[inline]
    pub async fn enroll(
        pool: &SqlitePool,
        user_id: i64,
        course_id: i64,
    ) -> Result<StudentProgress> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO student_progress (user_id, course_id, enrolled_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to enroll student")?;

        Self::get(pool, user_id, course_id)
            .await?
            .context("Failed to retrieve enrollment")
    }

    #[inline]
    pub async fn get(
        pool: &SqlitePool,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<StudentProgress>> {
        sqlx::query_as::<_, StudentProgress>(
            "SELECT id, user_id, course_id, video_watched, video_watched_at, exam_taken, \
             exam_score, exam_taken_at, enrolled_at \
             FROM student_progress WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get student progress")
    }

    #[inline]
    pub async fn mark_video_watched(
        pool: &SqlitePool,
        user_id: i64,
        course_id: i64,
    ) -> Result<StudentProgress> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO student_progress \
             (user_id, course_id, video_watched, video_watched_at, enrolled_at) \
             VALUES (?1, ?2, 1, ?3, ?3) \
             ON CONFLICT(user_id, course_id) DO UPDATE SET \
             video_watched = 1, video_watched_at = ?3",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to mark video watched")?;

        Self::get(pool, user_id, course_id)
            .await?
            .context("Failed to retrieve progress after video update")
    }

    #[inline]
    pub async fn record_exam_result(
        pool: &SqlitePool,
        user_id: i64,
        course_id: i64,
        score: f64,
    ) -> Result<StudentProgress> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO student_progress \
             (user_id, course_id, exam_taken, exam_score, exam_taken_at, enrolled_at) \
             VALUES (?1, ?2, 1, ?3, ?4, ?4) \
             ON CONFLICT(user_id, course_id) DO UPDATE SET \
             exam_taken = 1, exam_score = ?3, exam_taken_at = ?4",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(score)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to record exam result")?;

        Self::get(pool, user_id, course_id)
            .await?
            .context("Failed to retrieve progress after exam update")
    }
}
