//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the local SQLite database.
pub const SCHEMA: &str = r#"
-- Questions registered from quiz sources
CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    question_id TEXT NOT NULL,
    prompt TEXT NOT NULL,
    answer TEXT NOT NULL,
    question_type TEXT NOT NULL DEFAULT 'text',
    options TEXT,
    correct_answers TEXT,
    category TEXT,
    difficulty INTEGER NOT NULL DEFAULT 1,
    UNIQUE (source, question_id)
);

-- Append-only answer log
CREATE TABLE IF NOT EXISTS answer_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(id),
    submitted TEXT NOT NULL,
    is_correct INTEGER NOT NULL,
    answered_at TEXT NOT NULL,
    latency_ms INTEGER
);

-- Spaced-repetition state, one row per question
CREATE TABLE IF NOT EXISTS review_states (
    question_id INTEGER PRIMARY KEY REFERENCES questions(id),
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 1,
    repetitions INTEGER NOT NULL DEFAULT 0,
    difficulty REAL NOT NULL DEFAULT 2.5,
    next_due TEXT NOT NULL,
    last_reviewed TEXT
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_questions_source ON questions(source);
CREATE INDEX IF NOT EXISTS idx_answer_events_question ON answer_events(question_id);
CREATE INDEX IF NOT EXISTS idx_review_states_due ON review_states(next_due);
"#;

/// Record the schema version if not yet recorded.
pub const INIT_SCHEMA_VERSION: &str = r#"
INSERT OR IGNORE INTO schema_version (version) VALUES (?1);
"#;
