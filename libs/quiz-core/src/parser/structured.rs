//! JSON quiz sources.
//!
//! # Formats
//! ```json
//! [{"id": "py_1", "question": "Keyword for imports?", "answer": "import"}]
//! {"title": "...", "questions": [{"q": "...", "a": "...", "choices": ["..."]}]}
//! {"hello": "cześć", "goodbye": "żegnaj"}
//! ```
//!
//! Field aliases are resolved by serde: `question`/`q`, `answer`/`a`,
//! `options`/`choices`, `category`/`topic`.

use crate::error::{FormatError, Result};
use crate::types::{Question, QuestionKind};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Question object as written in a source file.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<RawScalar>,
    #[serde(default, alias = "q")]
    question: Option<String>,
    #[serde(default, alias = "a")]
    answer: Option<RawAnswer>,
    #[serde(default, alias = "choices")]
    options: Option<Vec<String>>,
    #[serde(default, alias = "topic")]
    category: Option<String>,
    /// Free-form metadata, read leniently by [`difficulty_level`].
    #[serde(default)]
    difficulty: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    correct_answers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl RawScalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    List(Vec<String>),
    Scalar(RawScalar),
}

/// Question type named by the `type` field.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DeclaredKind {
    Text,
    Single,
    Multi,
}

impl DeclaredKind {
    fn from_field(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("single_choice" | "single") => Self::Single,
            Some("multiple_choice" | "multi_choice" | "multi") => Self::Multi,
            Some("text" | "free_text") | None => Self::Text,
            Some(other) => {
                tracing::warn!(kind = other, "unknown question type, treating as text");
                Self::Text
            }
        }
    }
}

/// Parse JSON content into questions.
pub fn parse(source: &str, content: &str) -> Result<Vec<Question>> {
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => from_items(source, items),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => from_items(source, items),
            Some(_) => Err(FormatError::UnrecognizedShape(
                "`questions` must be a list of question objects",
            )),
            None => from_mapping(source, map),
        },
        _ => Err(FormatError::UnrecognizedShape(
            "expected a list, an object with `questions`, or a prompt-to-answer mapping",
        )),
    }
}

fn from_items(source: &str, items: Vec<Value>) -> Result<Vec<Question>> {
    let mut questions = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(source, index, "skipping non-object question entry");
            continue;
        }
        let raw: RawQuestion =
            serde_json::from_value(item).map_err(|e| FormatError::InvalidQuestion {
                index,
                reason: e.to_string(),
            })?;
        let question = raw.into_question(source, index)?;
        question.validate()?;
        questions.push(question);
    }

    Ok(questions)
}

fn from_mapping(source: &str, map: Map<String, Value>) -> Result<Vec<Question>> {
    map.into_iter()
        .enumerate()
        .map(|(index, (prompt, value))| {
            let answer = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(FormatError::InvalidQuestion {
                        index,
                        reason: format!("answer for {prompt:?} must be a string"),
                    })
                }
            };
            Ok(Question::free_text(source, prompt.clone(), prompt, answer))
        })
        .collect()
}

const DEFAULT_DIFFICULTY: u8 = 1;

/// Whole-number difficulty from a metadata value; unusable values fall back to the default.
fn difficulty_level(source: &str, index: usize, value: Option<Value>) -> u8 {
    let level = match &value {
        None | Some(Value::Null) => return DEFAULT_DIFFICULTY,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match level {
        Some(level) if level.is_finite() => level.round().clamp(0.0, f64::from(u8::MAX)) as u8,
        _ => {
            tracing::warn!(source, index, value = ?value, "ignoring unusable difficulty");
            DEFAULT_DIFFICULTY
        }
    }
}

fn split_answer_list(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl RawQuestion {
    fn into_question(self, source: &str, index: usize) -> Result<Question> {
        let id = self
            .id
            .map(RawScalar::into_text)
            .unwrap_or_else(|| index.to_string());
        let prompt = self.question.unwrap_or_default().trim().to_string();
        let declared = DeclaredKind::from_field(self.kind.as_deref());
        let mut options = self.options.unwrap_or_default();
        let correct_answers = self.correct_answers.unwrap_or_default();

        let invalid = |reason: &str| FormatError::InvalidQuestion {
            index,
            reason: reason.to_string(),
        };

        let (answer, kind) = match self.answer {
            // A list answer always makes a multi-choice question.
            Some(RawAnswer::List(correct)) => {
                if correct.is_empty() {
                    return Err(invalid("answer list is empty"));
                }
                if options.is_empty() {
                    options = correct.clone();
                }
                (correct.join(", "), QuestionKind::MultiChoice { options, correct })
            }
            scalar => {
                let answer = scalar.map(|a| match a {
                    RawAnswer::Scalar(s) => s.into_text(),
                    RawAnswer::List(items) => items.join(", "),
                });
                let answer = answer.unwrap_or_default().trim().to_string();
                Self::infer_kind(declared, answer, options, correct_answers)
                    .ok_or_else(|| invalid("question has no answer"))?
            }
        };

        Ok(Question {
            source: source.to_string(),
            id,
            prompt,
            answer,
            kind,
            category: self.category,
            difficulty: difficulty_level(source, index, self.difficulty),
        })
    }

    /// Decide the question type for a scalar (or missing) answer.
    fn infer_kind(
        declared: DeclaredKind,
        answer: String,
        options: Vec<String>,
        correct_answers: Vec<String>,
    ) -> Option<(String, QuestionKind)> {
        let multi = declared == DeclaredKind::Multi
            || (declared == DeclaredKind::Text && correct_answers.len() > 1);

        if multi {
            let correct = if correct_answers.is_empty() {
                split_answer_list(&answer)
            } else {
                correct_answers
            };
            if correct.is_empty() {
                return None;
            }
            let options = if options.is_empty() { correct.clone() } else { options };
            return Some((correct.join(", "), QuestionKind::MultiChoice { options, correct }));
        }

        let answer = if answer.is_empty() {
            correct_answers.into_iter().next().unwrap_or_default()
        } else {
            answer
        };
        if answer.is_empty() {
            return None;
        }

        if options.is_empty() {
            Some((answer, QuestionKind::FreeText))
        } else {
            Some((answer, QuestionKind::SingleChoice { options }))
        }
    }
}
