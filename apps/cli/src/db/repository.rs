//! SQLite-backed review store.

use crate::db::date_utils::{from_sql, to_sql};
use crate::db::DbError;
use crate::db::schema::{INIT_SCHEMA_VERSION, SCHEMA, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use quiz_core::store::{percentage, NewAnswer, RecordedAnswer, ReviewStore, PROBLEM_MIN_ATTEMPTS};
use quiz_core::{
    AnswerEvent, Outcome, ProblemQuestion, Question, QuestionKind, QuizStatistics, ReviewState,
    Scheduler, StoreResult, StoredQuestion,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

type Result<T> = std::result::Result<T, DbError>;

/// Columns read by [`SqliteRepository::row_to_stored`], in order.
const QUESTION_SELECT: &str = "SELECT q.id, q.source, q.question_id, q.prompt, q.answer,
        q.question_type, q.options, q.correct_answers, q.category, q.difficulty,
        s.ease_factor, s.interval_days, s.repetitions, s.difficulty, s.next_due, s.last_reviewed
    FROM questions q
    JOIN review_states s ON s.question_id = q.id";

/// SQLite implementation of [`ReviewStore`].
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute(INIT_SCHEMA_VERSION, params![SCHEMA_VERSION])?;
        Ok(())
    }

    fn register(&mut self, question: &Question, initial: &ReviewState) -> Result<i64> {
        let (options, correct) = match &question.kind {
            QuestionKind::FreeText => (None, None),
            QuestionKind::SingleChoice { options } => (Some(serde_json::to_string(options)?), None),
            QuestionKind::MultiChoice { options, correct } => (
                Some(serde_json::to_string(options)?),
                Some(serde_json::to_string(correct)?),
            ),
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO questions (source, question_id, prompt, answer, question_type, options, correct_answers, category, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(source, question_id) DO UPDATE SET
                prompt = excluded.prompt,
                answer = excluded.answer,
                question_type = excluded.question_type,
                options = excluded.options,
                correct_answers = excluded.correct_answers,
                category = excluded.category,
                difficulty = excluded.difficulty",
            params![
                question.source,
                question.id,
                question.prompt,
                question.answer,
                question.kind.as_str(),
                options,
                correct,
                question.category,
                question.difficulty,
            ],
        )?;
        let id: i64 = tx.query_row(
            "SELECT id FROM questions WHERE source = ?1 AND question_id = ?2",
            params![question.source, question.id],
            |row| row.get(0),
        )?;

        // Existing state survives re-registration.
        tx.execute(
            "INSERT OR IGNORE INTO review_states (question_id, ease_factor, interval_days, repetitions, difficulty, next_due, last_reviewed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                initial.ease_factor,
                initial.interval_days,
                initial.repetitions,
                initial.difficulty,
                to_sql(initial.next_due),
                initial.last_reviewed.map(to_sql),
            ],
        )?;
        tx.commit()?;
        Ok(id)
    }

    fn question(&self, id: i64) -> Result<Option<StoredQuestion>> {
        self.conn
            .query_row(
                &format!("{QUESTION_SELECT} WHERE q.id = ?1"),
                params![id],
                Self::row_to_stored,
            )
            .optional()
            .map_err(Into::into)
    }

    fn questions(&self, source: Option<&str>) -> Result<Vec<StoredQuestion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUESTION_SELECT} WHERE (?1 IS NULL OR q.source = ?1) ORDER BY q.id"
        ))?;
        let questions = stmt
            .query_map(params![source], Self::row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(questions)
    }

    fn due(&self, source: Option<&str>, now: DateTime<Utc>, limit: usize) -> Result<Vec<StoredQuestion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUESTION_SELECT}
             WHERE (s.last_reviewed IS NULL OR s.next_due <= ?1)
               AND (?2 IS NULL OR q.source = ?2)
             ORDER BY s.next_due ASC, s.difficulty DESC, q.id ASC
             LIMIT ?3"
        ))?;
        let questions = stmt
            .query_map(params![to_sql(now), source, limit as i64], Self::row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(questions)
    }

    fn record(&mut self, answer: NewAnswer<'_>, scheduler: &Scheduler) -> Result<RecordedAnswer> {
        let tx = self.conn.transaction()?;

        let previous = tx
            .query_row(
                "SELECT ease_factor, interval_days, repetitions, difficulty, next_due, last_reviewed
                 FROM review_states WHERE question_id = ?1",
                params![answer.question_id],
                |row| Self::row_to_state(row, 0),
            )
            .optional()?
            .ok_or(DbError::QuestionNotFound(answer.question_id))?;

        let result = scheduler.apply(&previous, Outcome::from_correct(answer.is_correct));
        let state = result.new_state;
        let answered_at = state.last_reviewed.unwrap_or_else(|| scheduler.now());
        let latency_ms = answer
            .latency
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));

        tx.execute(
            "INSERT INTO answer_events (question_id, submitted, is_correct, answered_at, latency_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                answer.question_id,
                answer.submitted,
                answer.is_correct,
                to_sql(answered_at),
                latency_ms,
            ],
        )?;
        let event_id = tx.last_insert_rowid();
        Self::update_state(&tx, answer.question_id, &state)?;
        tx.commit()?;

        Ok(RecordedAnswer {
            event: AnswerEvent {
                id: event_id,
                question_id: answer.question_id,
                submitted: answer.submitted.to_string(),
                is_correct: answer.is_correct,
                latency: answer.latency,
                answered_at,
            },
            previous,
            state,
        })
    }

    fn update_state(conn: &Connection, question_id: i64, state: &ReviewState) -> Result<()> {
        let updated = conn.execute(
            "UPDATE review_states
             SET ease_factor = ?2, interval_days = ?3, repetitions = ?4, difficulty = ?5,
                 next_due = ?6, last_reviewed = ?7
             WHERE question_id = ?1",
            params![
                question_id,
                state.ease_factor,
                state.interval_days,
                state.repetitions,
                state.difficulty,
                to_sql(state.next_due),
                state.last_reviewed.map(to_sql),
            ],
        )?;
        if updated == 0 {
            return Err(DbError::QuestionNotFound(question_id));
        }
        Ok(())
    }

    fn answers(&self, question_id: i64) -> Result<Vec<AnswerEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question_id, submitted, is_correct, latency_ms, answered_at
             FROM answer_events WHERE question_id = ?1 ORDER BY id",
        )?;
        let events = stmt
            .query_map(params![question_id], |row| {
                Ok(AnswerEvent {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    submitted: row.get(2)?,
                    is_correct: row.get(3)?,
                    latency: row
                        .get::<_, Option<i64>>(4)?
                        .map(|ms| Duration::from_millis(ms.max(0) as u64)),
                    answered_at: time_column(row, 5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn statistics(&self, source: Option<&str>) -> Result<QuizStatistics> {
        let (total_questions, learned_questions, average_difficulty) = self.conn.query_row(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN s.repetitions > 0 THEN 1 ELSE 0 END), 0) AS learned,
                COALESCE(AVG(s.difficulty), 2.5) AS avg_difficulty
            FROM questions q
            JOIN review_states s ON s.question_id = q.id
            WHERE (?1 IS NULL OR q.source = ?1)",
            params![source],
            |row| {
                Ok((
                    row.get::<_, usize>(0)?,
                    row.get::<_, usize>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            },
        )?;

        let (total_answers, correct_answers, average_latency_ms) = self.conn.query_row(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(a.is_correct), 0) AS correct,
                AVG(a.latency_ms) AS avg_latency
            FROM answer_events a
            JOIN questions q ON q.id = a.question_id
            WHERE (?1 IS NULL OR q.source = ?1)",
            params![source],
            |row| {
                Ok((
                    row.get::<_, usize>(0)?,
                    row.get::<_, usize>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            },
        )?;

        Ok(QuizStatistics {
            total_questions,
            total_answers,
            correct_answers,
            accuracy: percentage(correct_answers, total_answers),
            average_latency: average_latency_ms.map(|ms| ms / 1000.0),
            learned_questions,
            average_difficulty,
        })
    }

    fn problems(&self, source: Option<&str>, limit: usize) -> Result<Vec<ProblemQuestion>> {
        let mut stmt = self.conn.prepare(
            "SELECT q.id, q.prompt, q.answer, COUNT(a.id) AS attempts, SUM(a.is_correct) AS correct
             FROM questions q
             JOIN answer_events a ON a.question_id = q.id
             WHERE (?1 IS NULL OR q.source = ?1)
             GROUP BY q.id
             HAVING COUNT(a.id) >= ?2
             ORDER BY CAST(SUM(a.is_correct) AS REAL) / COUNT(a.id) ASC, attempts DESC, q.id ASC
             LIMIT ?3",
        )?;
        let problems = stmt
            .query_map(
                params![source, PROBLEM_MIN_ATTEMPTS as i64, limit as i64],
                |row| {
                    let attempts: usize = row.get(3)?;
                    let correct: usize = row.get(4)?;
                    Ok(ProblemQuestion {
                        question_id: row.get(0)?,
                        prompt: row.get(1)?,
                        answer: row.get(2)?,
                        attempts,
                        correct,
                        accuracy: correct as f64 / attempts as f64,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(problems)
    }

    fn sources(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT source FROM questions ORDER BY source")?;
        let sources = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn row_to_stored(row: &Row) -> rusqlite::Result<StoredQuestion> {
        let kind_name: String = row.get(5)?;
        let options = json_column(row, 6)?;
        let kind = match kind_name.as_str() {
            "text" => QuestionKind::FreeText,
            "single_choice" => QuestionKind::SingleChoice { options },
            "multiple_choice" => QuestionKind::MultiChoice {
                options,
                correct: json_column(row, 7)?,
            },
            other => return Err(conversion_error(5, format!("unknown question type {other:?}"))),
        };

        Ok(StoredQuestion {
            id: row.get(0)?,
            question: Question {
                source: row.get(1)?,
                id: row.get(2)?,
                prompt: row.get(3)?,
                answer: row.get(4)?,
                kind,
                category: row.get(8)?,
                difficulty: row.get(9)?,
            },
            state: Self::row_to_state(row, 10)?,
        })
    }

    /// Review state from six columns starting at `first`.
    fn row_to_state(row: &Row, first: usize) -> rusqlite::Result<ReviewState> {
        let last_reviewed = match row.get::<_, Option<String>>(first + 5)? {
            Some(raw) => Some(
                from_sql(&raw)
                    .ok_or_else(|| conversion_error(first + 5, format!("bad timestamp {raw:?}")))?,
            ),
            None => None,
        };
        Ok(ReviewState {
            ease_factor: row.get(first)?,
            interval_days: row.get(first + 1)?,
            repetitions: row.get(first + 2)?,
            difficulty: row.get(first + 3)?,
            next_due: time_column(row, first + 4)?,
            last_reviewed,
        })
    }
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn json_column(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| conversion_error(idx, format!("bad JSON list: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    from_sql(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp {raw:?}")))
}

impl ReviewStore for SqliteRepository {
    fn register_question(&mut self, question: &Question, scheduler: &Scheduler) -> StoreResult<i64> {
        Ok(self.register(question, &scheduler.initial_state())?)
    }

    fn get_question(&self, id: i64) -> StoreResult<Option<StoredQuestion>> {
        Ok(self.question(id)?)
    }

    fn list_questions(&self, source: Option<&str>) -> StoreResult<Vec<StoredQuestion>> {
        Ok(self.questions(source)?)
    }

    fn get_due(
        &self,
        source: Option<&str>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredQuestion>> {
        Ok(self.due(source, now, limit)?)
    }

    fn record_answer(
        &mut self,
        answer: NewAnswer<'_>,
        scheduler: &Scheduler,
    ) -> StoreResult<RecordedAnswer> {
        Ok(self.record(answer, scheduler)?)
    }

    fn answers_for(&self, question_id: i64) -> StoreResult<Vec<AnswerEvent>> {
        Ok(self.answers(question_id)?)
    }

    fn get_statistics(&self, source: Option<&str>) -> StoreResult<QuizStatistics> {
        Ok(self.statistics(source)?)
    }

    fn get_problem_questions(
        &self,
        source: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<ProblemQuestion>> {
        Ok(self.problems(source, limit)?)
    }

    fn list_sources(&self) -> StoreResult<Vec<String>> {
        Ok(self.sources()?)
    }
}
