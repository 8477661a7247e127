//! Review store interface and an in-memory implementation.

use crate::algorithm::Outcome;
use crate::error::{StoreError, StoreResult};
use crate::scheduler::{select_due, Scheduler};
use crate::types::{
    AnswerEvent, ProblemQuestion, Question, QuizStatistics, ReviewState, StoredQuestion,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Minimum attempts before a question can be reported as a problem.
pub const PROBLEM_MIN_ATTEMPTS: usize = 3;

/// An answer to be recorded.
#[derive(Debug, Clone, Copy)]
pub struct NewAnswer<'a> {
    pub question_id: i64,
    pub submitted: &'a str,
    pub is_correct: bool,
    pub latency: Option<Duration>,
}

/// What `record_answer` persisted.
#[derive(Debug, Clone)]
pub struct RecordedAnswer {
    pub event: AnswerEvent,
    pub previous: ReviewState,
    pub state: ReviewState,
}

/// Persistence for questions, their review state and the answer log.
///
/// Every operation is atomic for a single question. Mutating operations take
/// `&mut self`, so one question's state cannot be updated re-entrantly.
pub trait ReviewStore {
    /// Register a question, returning its stable id.
    ///
    /// Re-registering the same `(source, id)` updates the content fields and
    /// keeps the review state.
    fn register_question(&mut self, question: &Question, scheduler: &Scheduler) -> StoreResult<i64>;

    fn get_question(&self, id: i64) -> StoreResult<Option<StoredQuestion>>;

    /// All registered questions (optionally of one source) in id order.
    fn list_questions(&self, source: Option<&str>) -> StoreResult<Vec<StoredQuestion>>;

    /// Due or never-reviewed questions in due order, at most `limit`.
    fn get_due(
        &self,
        source: Option<&str>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredQuestion>>;

    /// Append an answer event and persist the scheduler's new state.
    fn record_answer(
        &mut self,
        answer: NewAnswer<'_>,
        scheduler: &Scheduler,
    ) -> StoreResult<RecordedAnswer>;

    /// Answer log of one question, oldest first.
    fn answers_for(&self, question_id: i64) -> StoreResult<Vec<AnswerEvent>>;

    fn get_statistics(&self, source: Option<&str>) -> StoreResult<QuizStatistics>;

    /// Questions with at least [`PROBLEM_MIN_ATTEMPTS`] answers, worst accuracy first.
    fn get_problem_questions(
        &self,
        source: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<ProblemQuestion>>;

    /// Distinct source ids with registered questions.
    fn list_sources(&self) -> StoreResult<Vec<String>>;
}

/// Register a batch of parsed questions, returning their ids in order.
pub fn register_all<S: ReviewStore + ?Sized>(
    store: &mut S,
    scheduler: &Scheduler,
    questions: &[Question],
) -> StoreResult<Vec<i64>> {
    let ids = questions
        .iter()
        .map(|q| store.register_question(q, scheduler))
        .collect::<StoreResult<Vec<_>>>()?;
    if let Some(first) = questions.first() {
        tracing::info!(source = %first.source, count = ids.len(), "registered questions");
    }
    Ok(ids)
}

/// Compute aggregate statistics from questions and their answers.
pub fn compute_statistics<'a>(
    questions: impl IntoIterator<Item = &'a StoredQuestion>,
    answers: impl IntoIterator<Item = &'a AnswerEvent>,
) -> QuizStatistics {
    let mut total_questions = 0;
    let mut learned_questions = 0;
    let mut difficulty_sum = 0.0;
    for q in questions {
        total_questions += 1;
        difficulty_sum += q.state.difficulty;
        if q.state.repetitions > 0 {
            learned_questions += 1;
        }
    }

    let mut total_answers = 0;
    let mut correct_answers = 0;
    let mut latencies = Vec::new();
    for a in answers {
        total_answers += 1;
        if a.is_correct {
            correct_answers += 1;
        }
        if let Some(latency) = a.latency {
            latencies.push(latency.as_secs_f64());
        }
    }

    QuizStatistics {
        total_questions,
        total_answers,
        correct_answers,
        accuracy: percentage(correct_answers, total_answers),
        average_latency: (!latencies.is_empty())
            .then(|| latencies.iter().sum::<f64>() / latencies.len() as f64),
        learned_questions,
        average_difficulty: if total_questions == 0 {
            ReviewState::DEFAULT_DIFFICULTY
        } else {
            difficulty_sum / total_questions as f64
        },
    }
}

/// `part / total` as a percentage, 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Order problem questions: lowest accuracy first, then most attempts.
pub fn sort_problems(problems: &mut [ProblemQuestion]) {
    problems.sort_by(|a, b| {
        a.accuracy
            .total_cmp(&b.accuracy)
            .then_with(|| b.attempts.cmp(&a.attempts))
            .then_with(|| a.question_id.cmp(&b.question_id))
    });
}

/// Review store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    questions: BTreeMap<i64, StoredQuestion>,
    answers: Vec<AnswerEvent>,
    next_question_id: i64,
    next_answer_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, source: &str, question_id: &str) -> Option<i64> {
        self.questions
            .values()
            .find(|q| q.question.source == source && q.question.id == question_id)
            .map(|q| q.id)
    }

    fn in_source<'a>(
        &'a self,
        source: Option<&'a str>,
    ) -> impl Iterator<Item = &'a StoredQuestion> + 'a {
        self.questions
            .values()
            .filter(move |q| source.map_or(true, |s| q.question.source == s))
    }
}

impl ReviewStore for MemoryStore {
    fn register_question(&mut self, question: &Question, scheduler: &Scheduler) -> StoreResult<i64> {
        if let Some(id) = self.find(&question.source, &question.id) {
            if let Some(existing) = self.questions.get_mut(&id) {
                existing.question = question.clone();
            }
            return Ok(id);
        }

        self.next_question_id += 1;
        let id = self.next_question_id;
        self.questions.insert(
            id,
            StoredQuestion {
                id,
                question: question.clone(),
                state: scheduler.initial_state(),
            },
        );
        Ok(id)
    }

    fn get_question(&self, id: i64) -> StoreResult<Option<StoredQuestion>> {
        Ok(self.questions.get(&id).cloned())
    }

    fn list_questions(&self, source: Option<&str>) -> StoreResult<Vec<StoredQuestion>> {
        Ok(self.in_source(source).cloned().collect())
    }

    fn get_due(
        &self,
        source: Option<&str>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredQuestion>> {
        Ok(select_due(self.in_source(source).cloned(), now, limit))
    }

    fn record_answer(
        &mut self,
        answer: NewAnswer<'_>,
        scheduler: &Scheduler,
    ) -> StoreResult<RecordedAnswer> {
        let stored = self
            .questions
            .get_mut(&answer.question_id)
            .ok_or(StoreError::QuestionNotFound(answer.question_id))?;

        let result = scheduler.apply(&stored.state, Outcome::from_correct(answer.is_correct));
        let previous = std::mem::replace(&mut stored.state, result.new_state.clone());

        self.next_answer_id += 1;
        let event = AnswerEvent {
            id: self.next_answer_id,
            question_id: answer.question_id,
            submitted: answer.submitted.to_string(),
            is_correct: answer.is_correct,
            latency: answer.latency,
            answered_at: result.new_state.last_reviewed.unwrap_or_else(|| scheduler.now()),
        };
        self.answers.push(event.clone());

        Ok(RecordedAnswer {
            event,
            previous,
            state: result.new_state,
        })
    }

    fn answers_for(&self, question_id: i64) -> StoreResult<Vec<AnswerEvent>> {
        Ok(self
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    fn get_statistics(&self, source: Option<&str>) -> StoreResult<QuizStatistics> {
        let questions: Vec<&StoredQuestion> = self.in_source(source).collect();
        let answers = self
            .answers
            .iter()
            .filter(|a| questions.iter().any(|q| q.id == a.question_id));
        Ok(compute_statistics(questions.iter().copied(), answers))
    }

    fn get_problem_questions(
        &self,
        source: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<ProblemQuestion>> {
        let mut problems: Vec<ProblemQuestion> = self
            .in_source(source)
            .filter_map(|q| {
                let (attempts, correct) = self
                    .answers
                    .iter()
                    .filter(|a| a.question_id == q.id)
                    .fold((0, 0), |(n, c), a| (n + 1, c + usize::from(a.is_correct)));
                (attempts >= PROBLEM_MIN_ATTEMPTS).then(|| ProblemQuestion {
                    question_id: q.id,
                    prompt: q.question.prompt.clone(),
                    answer: q.question.answer.clone(),
                    attempts,
                    correct,
                    accuracy: correct as f64 / attempts as f64,
                })
            })
            .collect();
        sort_problems(&mut problems);
        problems.truncate(limit);
        Ok(problems)
    }

    fn list_sources(&self) -> StoreResult<Vec<String>> {
        let mut sources: Vec<String> = self
            .questions
            .values()
            .map(|q| q.question.source.clone())
            .collect();
        sources.sort();
        sources.dedup();
        Ok(sources)
    }
}
