//! Shared fixtures for quiz-core integration tests.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use quiz_core::{Checked, Prompter, StoredQuestion, Submission};

pub const PYTHON_JSON: &str = r#"{
  "title": "Python basics",
  "questions": [
    {"id": "py_1", "question": "Keyword used to import a module?", "answer": "import", "category": "syntax"},
    {"id": "py_2", "q": "Which are Python data types?", "type": "multiple_choice",
     "choices": ["int", "string", "boolean", "array"], "correct_answers": ["int", "string", "boolean"]},
    {"id": "py_3", "question": "Output of len('abc')?", "answer": 3, "options": ["2", "3", "4"], "difficulty": 2}
  ]
}"#;

pub const HISTORY_MD: &str = "\
Q: Which battle took place in 1410?
A) Grunwald
B) Vienna
C) Kircholm
Answer: A

Q: Who wrote Pan Tadeusz?
A) Słowacki
B) Mickiewicz
C) Norwid
D) Sienkiewicz
Odpowiedź: B
";

/// Fixed start time for deterministic sessions.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 18, 30, 0).unwrap()
}

/// Temporary quiz directory with one structured and one text source.
pub fn quiz_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "python.json", PYTHON_JSON);
    write(dir.path(), "history.md", HISTORY_MD);
    write(dir.path(), "notes.pdf", "ignored");
    dir
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// How the scripted learner responds to a question.
pub enum Reply {
    Correct,
    Text(&'static str),
}

/// Prompter that replays a script and records what happened.
#[derive(Default)]
pub struct ScriptedLearner {
    pub replies: VecDeque<Reply>,
    pub seen: Vec<String>,
    pub verdicts: Vec<bool>,
}

impl ScriptedLearner {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Answers every question correctly, `n` times.
    pub fn always_correct(n: usize) -> Self {
        Self::new((0..n).map(|_| Reply::Correct))
    }
}

impl Prompter for ScriptedLearner {
    fn ask(
        &mut self,
        question: &StoredQuestion,
        _position: usize,
        _total: usize,
    ) -> io::Result<Option<Submission>> {
        self.seen.push(question.question.id.clone());
        let text = match self.replies.pop_front() {
            Some(Reply::Correct) => question.question.answer.clone(),
            Some(Reply::Text(text)) => text.to_string(),
            None => return Ok(None),
        };
        Ok(Some(Submission::new(text).with_latency(Duration::from_millis(2500))))
    }

    fn show_verdict(&mut self, _question: &StoredQuestion, checked: &Checked) -> io::Result<()> {
        self.verdicts.push(checked.verdict.is_correct);
        Ok(())
    }
}
