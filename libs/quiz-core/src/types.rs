//! Core types for the quiz application.

use crate::error::FormatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Question variant with the fields each variant needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    FreeText,
    SingleChoice {
        options: Vec<String>,
    },
    MultiChoice {
        options: Vec<String>,
        correct: Vec<String>,
    },
}

impl QuestionKind {
    /// Name used in persisted rows and source files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeText => "text",
            Self::SingleChoice { .. } => "single_choice",
            Self::MultiChoice { .. } => "multiple_choice",
        }
    }

    /// Option texts in presentation order (empty for free text).
    pub fn options(&self) -> &[String] {
        match self {
            Self::FreeText => &[],
            Self::SingleChoice { options } | Self::MultiChoice { options, .. } => options,
        }
    }
}

/// A question as read from a source.
///
/// Identity is the `(source, id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub source: String,
    pub id: String,
    pub prompt: String,
    /// Canonical answer text.
    pub answer: String,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Author-assigned difficulty from the source (1 when absent).
    pub difficulty: u8,
}

impl Question {
    pub fn free_text(
        source: impl Into<String>,
        id: impl Into<String>,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            prompt: prompt.into(),
            answer: answer.into(),
            kind: QuestionKind::FreeText,
            category: None,
            difficulty: 1,
        }
    }

    pub fn single_choice(
        source: impl Into<String>,
        id: impl Into<String>,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            kind: QuestionKind::SingleChoice { options },
            ..Self::free_text(source, id, prompt, answer)
        }
    }

    /// Multi-choice question; the canonical answer is the comma-joined correct set.
    pub fn multi_choice(
        source: impl Into<String>,
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: Vec<String>,
    ) -> Self {
        let answer = correct.join(", ");
        Self {
            kind: QuestionKind::MultiChoice { options, correct },
            ..Self::free_text(source, id, prompt, answer)
        }
    }

    /// Correct-answer texts: the correct set for choice questions, empty for free text.
    pub fn correct_answers(&self) -> Vec<&str> {
        match &self.kind {
            QuestionKind::FreeText => Vec::new(),
            QuestionKind::SingleChoice { .. } => vec![self.answer.as_str()],
            QuestionKind::MultiChoice { correct, .. } => {
                correct.iter().map(String::as_str).collect()
            }
        }
    }

    /// Check that every correct answer of a choice question names one of its options.
    pub fn validate(&self) -> Result<(), FormatError> {
        let options = self.kind.options();
        for answer in self.correct_answers() {
            let wanted = answer.trim().to_lowercase();
            if !options.iter().any(|o| o.trim().to_lowercase() == wanted) {
                return Err(FormatError::AnswerNotInOptions {
                    id: self.id.clone(),
                    answer: answer.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Spaced-repetition state of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    /// Scheduler difficulty; feeds the ease bonus and the due-order tie-break.
    pub difficulty: f64,
    pub next_due: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl ReviewState {
    pub const DEFAULT_EASE: f64 = 2.5;
    pub const DEFAULT_DIFFICULTY: f64 = 2.5;

    /// Fresh state for a question registered at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ease_factor: Self::DEFAULT_EASE,
            interval_days: 1,
            repetitions: 0,
            difficulty: Self::DEFAULT_DIFFICULTY,
            next_due: now,
            last_reviewed: None,
        }
    }

    /// Due when the next review time has passed or the question was never reviewed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_reviewed.is_none() || self.next_due <= now
    }
}

/// A registered question together with its store id and review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub id: i64,
    pub question: Question,
    pub state: ReviewState,
}

/// Immutable record of one answer submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub id: i64,
    pub question_id: i64,
    pub submitted: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    pub answered_at: DateTime<Utc>,
}

/// Aggregate counters over questions and answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizStatistics {
    pub total_questions: usize,
    pub total_answers: usize,
    pub correct_answers: usize,
    /// Percentage of correct answers (0 when nothing was answered).
    pub accuracy: f64,
    /// Mean response latency in seconds over answers that carried one.
    pub average_latency: Option<f64>,
    pub learned_questions: usize,
    pub average_difficulty: f64,
}

/// Question answered at least a few times with its accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemQuestion {
    pub question_id: i64,
    pub prompt: String,
    pub answer: String,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Question selection mode for a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    Review,
    Random,
}

impl Default for StudyMode {
    fn default() -> Self {
        Self::Review
    }
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Random => "random",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_review_state_is_due_immediately() {
        let now = Utc::now();
        let state = ReviewState::new(now);
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.interval_days, 1);
        assert_eq!(state.repetitions, 0);
        assert!(state.is_due(now));
    }

    #[test]
    fn never_reviewed_is_due_even_with_future_date() {
        let now = Utc::now();
        let mut state = ReviewState::new(now + chrono::Duration::days(3));
        assert!(state.is_due(now));
        state.last_reviewed = Some(now);
        assert!(!state.is_due(now));
    }

    #[test]
    fn multi_choice_joins_canonical_answer() {
        let q = Question::multi_choice(
            "s",
            "1",
            "Pick",
            options(&["int", "string", "array"]),
            options(&["int", "string"]),
        );
        assert_eq!(q.answer, "int, string");
        assert_eq!(q.correct_answers(), vec!["int", "string"]);
    }

    #[test]
    fn validate_accepts_case_insensitive_option_match() {
        let q = Question::single_choice("s", "1", "Capital?", " paris ", options(&["Paris", "Rome"]));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn validate_rejects_answer_outside_options() {
        let q = Question::single_choice("s", "1", "Capital?", "Berlin", options(&["Paris", "Rome"]));
        assert!(matches!(
            q.validate(),
            Err(FormatError::AnswerNotInOptions { .. })
        ));
    }
}
