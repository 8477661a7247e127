//! Error types for quiz-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FormatError.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Result type alias for review store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or parsing a quiz source.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported source kind: {0:?}")]
    UnsupportedKind(String),

    #[error("cannot read source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unrecognized top-level shape: {0}")]
    UnrecognizedShape(&'static str),

    #[error("invalid question at index {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    #[error("question {id}: correct answer {answer:?} is not one of the options")]
    AnswerNotInOptions { id: String, answer: String },
}

/// Errors reported by a review store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("question not found: {0}")]
    QuestionNotFound(i64),

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that end a study session early.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("input error: {0}")]
    Input(#[from] std::io::Error),
}
