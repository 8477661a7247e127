//! Runtime configuration from the environment.
//!
//! Values come from (highest priority first) command-line flags, process
//! environment, a `.env` file loaded by `dotenvy`, then built-in defaults.

use quiz_core::session::DEFAULT_MAX_QUESTIONS;
use std::path::PathBuf;
use thiserror::Error;

pub const DB_PATH_VAR: &str = "QUIZ_DB_PATH";
pub const QUIZ_DIR_VAR: &str = "QUIZ_DIR";
pub const MAX_QUESTIONS_VAR: &str = "QUIZ_MAX_QUESTIONS";

const DEFAULT_QUIZ_DIR: &str = "quizzes";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub quiz_dir: PathBuf,
    pub max_questions: usize,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let quiz_dir = lookup(QUIZ_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QUIZ_DIR));

        let max_questions = match lookup(MAX_QUESTIONS_VAR) {
            Some(value) => parse_positive(MAX_QUESTIONS_VAR, &value)?,
            None => DEFAULT_MAX_QUESTIONS,
        };

        Ok(Self {
            db_path,
            quiz_dir,
            max_questions,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

/// Database location under the platform data directory, or the working
/// directory when none is known.
pub fn default_db_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("quiz-srs").join("quiz.db"),
        None => PathBuf::from("quiz.db"),
    }
}
