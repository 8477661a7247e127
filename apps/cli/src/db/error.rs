//! Database error types.

use quiz_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json column error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question not found: {0}")]
    QuestionNotFound(i64),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::QuestionNotFound(id) => StoreError::QuestionNotFound(id),
            DbError::InvalidData(msg) => StoreError::InvalidData(msg),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}
