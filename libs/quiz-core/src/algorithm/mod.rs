//! Spaced repetition algorithm implementations.

pub mod sm2;

use crate::types::ReviewState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }
}

/// Result of scheduling a question after an answer.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub new_state: ReviewState,
    pub next_due: DateTime<Utc>,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Calculate the next review state after an answer.
    fn schedule(&self, state: &ReviewState, outcome: Outcome, now: DateTime<Utc>) -> SchedulingResult;

    /// Initial state for a question registered at `now`.
    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState;
}
