//! Core library of the quiz spaced-repetition trainer.
//!
//! Provides:
//! - Parsers for structured (JSON) and loosely-structured (Markdown/text) quiz sources
//! - SM-2 scheduling with an injectable clock
//! - Answer verification for free-text and choice questions
//! - The review store interface with an in-memory implementation
//! - A session coordinator driving bounded study sessions

pub mod algorithm;
pub mod clock;
pub mod error;
pub mod matching;
pub mod parser;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod types;

pub use algorithm::{Outcome, SchedulingResult, SpacedRepetitionAlgorithm};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{FormatError, Result, SessionError, StoreError, StoreResult};
pub use matching::{verify, MatchKind, Verdict};
pub use parser::{discover_sources, parse, parse_file, Source, SourceKind};
pub use scheduler::Scheduler;
pub use session::{
    parse_command, submit_answer, Checked, Command, Prompter, SessionConfig, SessionCoordinator,
    SessionEnd, SessionReport, SessionSnapshot, Submission,
};
pub use store::{register_all, MemoryStore, NewAnswer, RecordedAnswer, ReviewStore};
pub use types::{
    AnswerEvent, ProblemQuestion, Question, QuestionKind, QuizStatistics, ReviewState,
    StoredQuestion, StudyMode,
};
