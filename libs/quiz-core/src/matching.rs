//! Answer verification for free-text and choice questions.

use crate::types::{Question, QuestionKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical answers longer than this (in characters) accept partial matches.
pub const PARTIAL_MATCH_MIN_CHARS: usize = 10;

/// Minimum share of the canonical answer's words a partial match must cover.
pub const COVERAGE_THRESHOLD: f64 = 0.70;

const CHOICE_LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

/// How a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Normalized texts were equal.
    Exact,
    /// Free text accepted on word coverage.
    Partial,
    /// Choice answer given as option letters.
    Letters,
    /// Choice answer given as option texts.
    Text,
    NoMatch,
}

/// Result of verifying a submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    pub match_kind: MatchKind,
    /// Word coverage of the canonical answer, for long free-text answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    /// Normalized submitted answer (for display).
    pub submitted_normalized: String,
    /// Normalized canonical answer (for display).
    pub expected_normalized: String,
}

/// Trim and case-fold.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Verify `submitted` against the question's canonical answer.
pub fn verify(question: &Question, submitted: &str) -> Verdict {
    let submitted_normalized = normalize(submitted);
    let expected_normalized = normalize(&question.answer);

    let (is_correct, match_kind, coverage) = match &question.kind {
        QuestionKind::FreeText => verify_free_text(&submitted_normalized, &expected_normalized),
        QuestionKind::SingleChoice { options } => {
            verify_single_choice(&submitted_normalized, &expected_normalized, options)
        }
        QuestionKind::MultiChoice { options, correct } => {
            verify_multi_choice(submitted, &submitted_normalized, options, correct)
        }
    };

    Verdict {
        is_correct,
        match_kind,
        coverage,
        submitted_normalized,
        expected_normalized,
    }
}

/// Share of `expected`'s distinct words that also appear in `submitted`.
pub fn word_coverage(expected: &str, submitted: &str) -> f64 {
    let expected: BTreeSet<&str> = expected.split_whitespace().collect();
    if expected.is_empty() {
        return 0.0;
    }
    let submitted: BTreeSet<&str> = submitted.split_whitespace().collect();
    expected.intersection(&submitted).count() as f64 / expected.len() as f64
}

fn verify_free_text(submitted: &str, expected: &str) -> (bool, MatchKind, Option<f64>) {
    if submitted == expected {
        return (true, MatchKind::Exact, None);
    }
    if expected.chars().count() <= PARTIAL_MATCH_MIN_CHARS {
        return (false, MatchKind::NoMatch, None);
    }

    let coverage = word_coverage(expected, submitted);
    if coverage >= COVERAGE_THRESHOLD {
        (true, MatchKind::Partial, Some(coverage))
    } else {
        (false, MatchKind::NoMatch, Some(coverage))
    }
}

/// Zero-based option index for a single letter `a`..`d`.
fn letter_index(c: char) -> Option<usize> {
    CHOICE_LETTERS.iter().position(|&l| l == c)
}

fn verify_single_choice(
    submitted: &str,
    expected: &str,
    options: &[String],
) -> (bool, MatchKind, Option<f64>) {
    let mut chars = submitted.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) => letter_index(c).and_then(|i| options.get(i)),
        _ => None,
    };

    // Out-of-range letters fall through to text comparison.
    let (candidate, kind) = match letter {
        Some(option) => (normalize(option), MatchKind::Letters),
        None => (submitted.to_string(), MatchKind::Text),
    };

    if candidate == expected {
        (true, kind, None)
    } else {
        (false, MatchKind::NoMatch, None)
    }
}

fn verify_multi_choice(
    raw: &str,
    submitted: &str,
    options: &[String],
    correct: &[String],
) -> (bool, MatchKind, Option<f64>) {
    let expected: BTreeSet<String> = correct.iter().map(|c| normalize(c)).collect();

    let is_letter_list = submitted
        .chars()
        .all(|c| c == ',' || c.is_whitespace() || CHOICE_LETTERS.contains(&c));

    let (given, kind): (BTreeSet<String>, _) = if is_letter_list {
        let picked = submitted
            .chars()
            .filter_map(letter_index)
            .filter_map(|i| options.get(i))
            .map(|o| normalize(o))
            .collect();
        (picked, MatchKind::Letters)
    } else {
        let picked = raw.split(',').map(normalize).collect();
        (picked, MatchKind::Text)
    };

    if given == expected {
        (true, kind, None)
    } else {
        (false, MatchKind::NoMatch, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn capital() -> Question {
        Question::single_choice(
            "geo",
            "1",
            "Capital of France?",
            "Paris",
            strings(&["Paris", "London", "Rome"]),
        )
    }

    fn data_types() -> Question {
        Question::multi_choice(
            "py",
            "4",
            "Which are Python data types?",
            strings(&["int", "string", "boolean", "array"]),
            strings(&["int", "string", "boolean"]),
        )
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello World \n"), "hello world");
        assert_eq!(normalize("ŻEGNAJ"), "żegnaj");
    }

    #[test]
    fn test_single_choice_accepts_letter_and_text() {
        let q = capital();
        for answer in ["A", "a", "paris", " Paris "] {
            assert!(verify(&q, answer).is_correct, "{answer:?} should be correct");
        }
        for answer in ["B", "rome"] {
            assert!(!verify(&q, answer).is_correct, "{answer:?} should be wrong");
        }
        assert_eq!(verify(&q, "a").match_kind, MatchKind::Letters);
        assert_eq!(verify(&q, "paris").match_kind, MatchKind::Text);
    }

    #[test]
    fn test_single_choice_out_of_range_letter_compares_text() {
        let q = Question::single_choice("s", "1", "Letter?", "d", strings(&["a", "b", "d"]));
        // "d" is offset 3 which has no option, so it is compared as text.
        assert!(verify(&q, "D").is_correct);
        assert!(!verify(&q, "B").is_correct);
    }

    #[test]
    fn test_multi_choice_letters_and_texts() {
        let q = data_types();
        for answer in ["A, B, C", "a,c,b", "int, boolean, string", "C B A", "a, a, b, c"] {
            assert!(verify(&q, answer).is_correct, "{answer:?} should be correct");
        }
        for answer in ["A, B", "A, B, C, D", "int, string", ""] {
            assert!(!verify(&q, answer).is_correct, "{answer:?} should be wrong");
        }
    }

    #[test]
    fn test_multi_choice_drops_letters_without_option() {
        let q = Question::multi_choice(
            "s",
            "1",
            "Pick",
            strings(&["x", "y"]),
            strings(&["x", "y"]),
        );
        assert!(verify(&q, "a, b, d").is_correct);
    }

    #[test]
    fn test_free_text_exact() {
        let q = Question::free_text("v", "hello", "hello", "cześć");
        assert!(verify(&q, " Cześć ").is_correct);
        assert!(!verify(&q, "czesc").is_correct);
    }

    #[test]
    fn test_free_text_partial_coverage() {
        let q = Question::free_text("s", "1", "Pangram start?", "the quick brown fox jumps");

        let four_of_five = verify(&q, "quick brown fox jumps");
        assert!(four_of_five.is_correct);
        assert_eq!(four_of_five.match_kind, MatchKind::Partial);
        assert_eq!(four_of_five.coverage, Some(0.8));

        let three_of_five = verify(&q, "the quick fox");
        assert!(!three_of_five.is_correct);
        assert_eq!(three_of_five.coverage, Some(0.6));
    }

    #[test]
    fn test_short_answers_need_exact_match() {
        let q = Question::free_text("s", "1", "Define fn?", "def name():");
        assert!(!verify(&q, "def").is_correct);
        // Exactly ten characters is not long enough for partial matching.
        let q = Question::free_text("s", "2", "Ten chars?", "aaaa bbbbb");
        assert!(!verify(&q, "aaaa bbbbb extra").is_correct);
    }

    #[test]
    fn test_word_coverage_is_recall_not_jaccard() {
        let coverage = word_coverage("alpha beta", "alpha beta gamma delta");
        assert_eq!(coverage, 1.0);
        assert_eq!(word_coverage("", "anything"), 0.0);
    }

    #[test]
    fn test_empty_submission_is_a_verdict() {
        let verdict = verify(&capital(), "   ");
        assert!(!verdict.is_correct);
        assert_eq!(verdict.submitted_normalized, "");
    }
}
