
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: i64,
    pub video_url: Option<String>,
    pub video_transcript: Option<String>,
    pub prerequisites: Option<String>,
    pub is_published: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: i64,
    pub video_url: Option<String>,
    pub video_transcript: Option<String>,
    pub prerequisites: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_transcript: Option<String>,
    pub prerequisites: Option<String>,
    pub is_published: Option<bool>,
}

/// Document ingested into the retrieval pipeline. `content` holds the
/// newline-joined chunk concatenation, not the raw extracted text, and
/// `vector_id` points at the first chunk's vector record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RagDocument {
    pub id: i64,
    pub course_id: i64,
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub vector_id: Option<String>,
    pub mime_type: Option<String>,
    pub file_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRagDocument {
    pub course_id: i64,
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub vector_id: Option<String>,
    pub mime_type: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Append-only chat record; history for a (user, course) pair is the
/// insertion-ordered sequence of these rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub user_id: i64,
    pub course_id: i64,
    pub role: ChatRole,
    pub content: String,
}

/// Per-course assistant settings; at most one row per course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AiConfiguration {
    pub id: i64,
    pub course_id: i64,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AiConfigurationUpdate {
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

impl AiConfigurationUpdate {
    /// Validate field bounds before saving
    #[inline]
    pub fn validate(&self) -> Result<(), String> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "temperature {temperature} out of range (must be between 0.0 and 2.0)"
                ));
            }
        }

        if let Some(max_tokens) = self.max_tokens {
            if !(100..=4000).contains(&max_tokens) {
                return Err(format!(
                    "max_tokens {max_tokens} out of range (must be between 100 and 4000)"
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub passing_score: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExam {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub passing_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    Essay,
}

impl std::fmt::Display for QuestionType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ExamQuestion {
    pub id: i64,
    pub exam_id: i64,
    pub question: String,
    pub question_type: QuestionType,
    /// JSON-encoded answer options for multiple-choice questions
    pub options: Option<String>,
    pub correct_answer: Option<String>,
    pub points: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExamQuestion {
    pub exam_id: i64,
    pub question: String,
    pub question_type: QuestionType,
    pub options: Option<String>,
    pub correct_answer: Option<String>,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StudentProgress {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub video_watched: bool,
    pub video_watched_at: Option<NaiveDateTime>,
    pub exam_taken: bool,
    pub exam_score: Option<f64>,
    pub exam_taken_at: Option<NaiveDateTime>,
    pub enrolled_at: NaiveDateTime,
}
