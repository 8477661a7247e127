//! Bounded study sessions.
//!
//! A [`SessionCoordinator`] pulls questions through the [`Scheduler`], hands
//! them to a [`Prompter`], verifies the submissions and records the outcome in
//! the [`ReviewStore`]. Its counters live only as long as the session.

use crate::error::{SessionError, StoreResult};
use crate::matching::{verify, Verdict};
use crate::scheduler::Scheduler;
use crate::store::{percentage, NewAnswer, RecordedAnswer, ReviewStore};
use crate::types::{StoredQuestion, StudyMode};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::time::Duration;

/// Questions presented per session unless configured otherwise.
pub const DEFAULT_MAX_QUESTIONS: usize = 20;

const QUIT_TOKENS: [&str; 3] = ["quit", "exit", "koniec"];
const SKIP_TOKENS: [&str; 3] = ["skip", "pomiń", "pomin"];

/// Reserved submissions that steer the session instead of answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Skip,
}

/// Recognize a reserved command, ignoring case and surrounding whitespace.
pub fn parse_command(input: &str) -> Option<Command> {
    let token = input.trim().to_lowercase();
    if QUIT_TOKENS.contains(&token.as_str()) {
        Some(Command::Quit)
    } else if SKIP_TOKENS.contains(&token.as_str()) {
        Some(Command::Skip)
    } else {
        None
    }
}

/// A submitted answer and how long the learner took.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub text: String,
    pub latency: Option<Duration>,
}

impl Submission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// Verdict together with what was persisted for it.
#[derive(Debug, Clone)]
pub struct Checked {
    pub verdict: Verdict,
    pub recorded: RecordedAnswer,
}

/// The user-facing side of a session.
pub trait Prompter {
    /// Present a question and wait for a submission.
    ///
    /// `Ok(None)` means input is exhausted and ends the session like quit.
    fn ask(
        &mut self,
        question: &StoredQuestion,
        position: usize,
        total: usize,
    ) -> io::Result<Option<Submission>>;

    fn show_verdict(&mut self, question: &StoredQuestion, checked: &Checked) -> io::Result<()>;

    fn show_skipped(&mut self, _question: &StoredQuestion) -> io::Result<()> {
        Ok(())
    }
}

/// Verify a submission and record the outcome.
pub fn submit_answer<S: ReviewStore + ?Sized>(
    store: &mut S,
    scheduler: &Scheduler,
    question: &StoredQuestion,
    submitted: &str,
    latency: Option<Duration>,
) -> StoreResult<Checked> {
    let verdict = verify(&question.question, submitted);
    let recorded = store.record_answer(
        NewAnswer {
            question_id: question.id,
            submitted,
            is_correct: verdict.is_correct,
            latency,
        },
        scheduler,
    )?;
    tracing::debug!(
        question_id = question.id,
        correct = verdict.is_correct,
        interval = recorded.state.interval_days,
        "answer recorded"
    );
    Ok(Checked { verdict, recorded })
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: StudyMode,
    /// Restrict the session to one source id.
    pub source: Option<String>,
    pub max_questions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: StudyMode::default(),
            source: None,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    CapReached,
    /// Nothing left to present.
    CaughtUp,
    /// The store holds no questions for the session's filter.
    NoQuestions,
    Quit,
}

struct SessionStats {
    asked: usize,
    correct: usize,
    skipped: usize,
    started: DateTime<Utc>,
}

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Questions presented, skipped ones included.
    pub asked: usize,
    pub answered: usize,
    pub correct: usize,
    pub skipped: usize,
    /// Percentage of answered questions that were correct.
    pub accuracy: f64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub stats: SessionSnapshot,
}

/// Drives one study session over a borrowed store.
pub struct SessionCoordinator<'a, S: ReviewStore + ?Sized> {
    store: &'a mut S,
    scheduler: &'a Scheduler,
    config: SessionConfig,
    stats: SessionStats,
    skipped: HashSet<i64>,
}

impl<'a, S: ReviewStore + ?Sized> SessionCoordinator<'a, S> {
    pub fn new(store: &'a mut S, scheduler: &'a Scheduler, config: SessionConfig) -> Self {
        let started = scheduler.now();
        Self {
            store,
            scheduler,
            config,
            stats: SessionStats {
                asked: 0,
                correct: 0,
                skipped: 0,
                started,
            },
            skipped: HashSet::new(),
        }
    }

    pub fn stats(&self) -> SessionSnapshot {
        let answered = self.stats.asked - self.stats.skipped;
        SessionSnapshot {
            asked: self.stats.asked,
            answered,
            correct: self.stats.correct,
            skipped: self.stats.skipped,
            accuracy: percentage(self.stats.correct, answered),
            elapsed: (self.scheduler.now() - self.stats.started)
                .to_std()
                .unwrap_or_default(),
        }
    }

    /// Run the session to completion and report its counters.
    pub fn run<P, R>(mut self, prompter: &mut P, rng: &mut R) -> Result<SessionReport, SessionError>
    where
        P: Prompter + ?Sized,
        R: Rng + ?Sized,
    {
        let max = self.config.max_questions;
        tracing::info!(
            mode = self.config.mode.as_str(),
            source = self.config.source.as_deref().unwrap_or("*"),
            max,
            "session started"
        );

        let end = loop {
            if self.stats.asked >= max {
                break SessionEnd::CapReached;
            }

            let source = self.config.source.as_deref();
            let next = self.scheduler.next_question(
                &*self.store,
                self.config.mode,
                source,
                &self.skipped,
                rng,
            )?;
            let Some(question) = next else {
                break if self.stats.asked == 0 && self.store.list_questions(source)?.is_empty() {
                    SessionEnd::NoQuestions
                } else {
                    SessionEnd::CaughtUp
                };
            };

            let Some(submission) = prompter.ask(&question, self.stats.asked + 1, max)? else {
                break SessionEnd::Quit;
            };

            match parse_command(&submission.text) {
                Some(Command::Quit) => break SessionEnd::Quit,
                Some(Command::Skip) => {
                    self.stats.asked += 1;
                    self.stats.skipped += 1;
                    self.skipped.insert(question.id);
                    prompter.show_skipped(&question)?;
                }
                None => {
                    let checked = submit_answer(
                        &mut *self.store,
                        self.scheduler,
                        &question,
                        &submission.text,
                        submission.latency,
                    )?;
                    self.stats.asked += 1;
                    if checked.verdict.is_correct {
                        self.stats.correct += 1;
                    }
                    prompter.show_verdict(&question, &checked)?;
                }
            }
        };

        let stats = self.stats();
        tracing::info!(
            end = ?end,
            asked = stats.asked,
            correct = stats.correct,
            skipped = stats.skipped,
            "session finished"
        );
        Ok(SessionReport { end, stats })
    }
}
