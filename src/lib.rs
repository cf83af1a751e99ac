use thiserror::Error;

pub type Result<T> = std::result::Result<T, AulaError>;

#[derive(Error, Debug)]
pub enum AulaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod auth;
pub mod chat;
pub mod commands;
pub mod config;
pub mod database;
pub mod exams;
pub mod ingestion;
pub mod openai;
pub mod storage;
