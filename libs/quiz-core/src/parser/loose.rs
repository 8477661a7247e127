//! Line-oriented text sources (Markdown and plain text).
//!
//! # Formats
//! Matchers are tried in order; the first one producing at least one
//! question wins and the rest are ignored.
//!
//! 1. Choice blocks:
//!    ```markdown
//!    Q: Which battle took place in 1410?
//!    A) Grunwald
//!    B) Vienna
//!    C) Komarów
//!    D) Kircholm
//!    Answer: A
//!    ```
//!    Labels may use `A)`, `A.` or `A]`. The answer line may start with
//!    `Answer:`, `Odpowiedź:`, `Poprawna:` or `Correct:`.
//! 2. `Q:` / `A:` line pairs
//! 3. `## prompt` headers followed by a body
//! 4. `**prompt**` lines followed by a body
//! 5. lines ending in `?` followed by a body
//! 6. fallback: non-empty lines paired up in order
//!
//! Bodies run until a blank line or the start of the next block.

use crate::types::Question;

const ANSWER_PREFIXES: [&str; 4] = ["Answer:", "Odpowiedź:", "Poprawna:", "Correct:"];
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Which grammar produced the questions of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    ChoiceBlock,
    LinePair,
    Header,
    Emphasis,
    QuestionMark,
    LineFallback,
}

/// Parse text content into questions.
pub fn parse(source: &str, content: &str) -> Vec<Question> {
    let (matcher, questions) = parse_with_matcher(source, content);
    if let Some(matcher) = matcher {
        tracing::debug!(source, ?matcher, count = questions.len(), "matched text grammar");
    }
    questions
}

/// Parse and report which matcher was used (`None` when nothing matched).
pub fn parse_with_matcher(source: &str, content: &str) -> (Option<Matcher>, Vec<Question>) {
    let lines: Vec<&str> = content.lines().collect();
    let mut ids = IdCounter::default();

    let choice: Vec<Question> = choice_blocks(&lines)
        .into_iter()
        .filter_map(|block| block.into_question(source, &mut ids))
        .collect();
    if !choice.is_empty() {
        return (Some(Matcher::ChoiceBlock), choice);
    }

    let pair_matchers: [(Matcher, fn(&[&str]) -> Vec<(String, String)>); 4] = [
        (Matcher::LinePair, line_pairs),
        (Matcher::Header, |lines| headed_pairs(lines, header_prompt)),
        (Matcher::Emphasis, |lines| headed_pairs(lines, emphasis_prompt)),
        (Matcher::QuestionMark, |lines| headed_pairs(lines, question_mark_prompt)),
    ];
    for (matcher, find) in pair_matchers {
        let pairs = find(&lines);
        if !pairs.is_empty() {
            return (Some(matcher), free_text(source, pairs, &mut ids));
        }
    }

    let pairs = fallback_pairs(&lines);
    if pairs.is_empty() {
        (None, Vec::new())
    } else {
        (Some(Matcher::LineFallback), free_text(source, pairs, &mut ids))
    }
}

/// Sequential question ids in emission order.
#[derive(Default)]
struct IdCounter(usize);

impl IdCounter {
    fn next(&mut self) -> String {
        let id = self.0.to_string();
        self.0 += 1;
        id
    }
}

fn free_text(source: &str, pairs: Vec<(String, String)>, ids: &mut IdCounter) -> Vec<Question> {
    pairs
        .into_iter()
        .map(|(prompt, answer)| Question::free_text(source, ids.next(), prompt, answer))
        .collect()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.trim().strip_prefix(tag).map(str::trim)
}

// ---------------------------------------------------------------------------
// Choice blocks

struct ChoiceBlock {
    prompt: String,
    /// Present, non-empty options in label order.
    options: Vec<(char, String)>,
    letters: Vec<char>,
}

impl ChoiceBlock {
    fn into_question(self, source: &str, ids: &mut IdCounter) -> Option<Question> {
        let mut correct: Vec<(char, &str)> = self
            .options
            .iter()
            .filter(|(label, _)| self.letters.contains(label))
            .map(|(label, text)| (*label, text.as_str()))
            .collect();
        correct.sort_by_key(|(label, _)| *label);

        if correct.is_empty() {
            tracing::warn!(source, prompt = %self.prompt, "skipping choice block without a valid answer label");
            return None;
        }

        let correct: Vec<String> = correct.into_iter().map(|(_, t)| t.to_string()).collect();
        let options: Vec<String> = self.options.into_iter().map(|(_, t)| t).collect();
        let id = ids.next();

        Some(if correct.len() == 1 {
            let answer = correct.into_iter().next().unwrap_or_default();
            Question::single_choice(source, id, self.prompt, answer, options)
        } else {
            Question::multi_choice(source, id, self.prompt, options, correct)
        })
    }
}

fn choice_blocks(lines: &[&str]) -> Vec<ChoiceBlock> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        match read_choice_block(lines, i) {
            Some((block, next)) => {
                blocks.push(block);
                i = next;
            }
            None => i += 1,
        }
    }

    blocks
}

/// Read a choice block starting at `start`, returning it and the next line index.
fn read_choice_block(lines: &[&str], start: usize) -> Option<(ChoiceBlock, usize)> {
    let prompt = strip_tag(lines[start], "Q:")?;
    if prompt.is_empty() {
        return None;
    }

    let mut options = Vec::new();
    let mut last_label = None;
    let mut j = start + 1;

    while j < lines.len() {
        match option_line(lines[j]) {
            Some((label, text)) if last_label.map_or(true, |last| label > last) => {
                if !text.is_empty() {
                    options.push((label, text.to_string()));
                }
                last_label = Some(label);
                j += 1;
            }
            _ => break,
        }
    }

    if last_label.is_none() || j >= lines.len() {
        return None;
    }
    let letters = answer_letters(lines[j])?;

    Some((
        ChoiceBlock {
            prompt: prompt.to_string(),
            options,
            letters,
        },
        j + 1,
    ))
}

/// `A) text`, `B. text` or `C] text`.
fn option_line(line: &str) -> Option<(char, &str)> {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    let label = chars.next().filter(|c| OPTION_LABELS.contains(c))?;
    let bracket = chars.next()?;
    if !matches!(bracket, ')' | '.' | ']') {
        return None;
    }
    Some((label, trimmed[2..].trim()))
}

/// Letters named on an answer line; `None` if the line is not an answer line.
fn answer_letters(line: &str) -> Option<Vec<char>> {
    let rest = ANSWER_PREFIXES
        .iter()
        .find_map(|prefix| strip_tag(line, prefix))?;

    let allowed = |c: char| c == ',' || c.is_whitespace() || OPTION_LABELS.contains(&c.to_ascii_uppercase());
    if rest.is_empty() || !rest.chars().all(allowed) {
        return None;
    }

    // Tokens that are not a single label (e.g. "AB") name no option.
    let letters = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c.to_ascii_uppercase()),
                _ => None,
            }
        })
        .collect();
    Some(letters)
}

// ---------------------------------------------------------------------------
// Free-text pairs

/// Collect body lines from `start` until a blank line, EOF or a line for which `stop` holds.
fn read_body(
    lines: &[&str],
    start: usize,
    first: &str,
    stop: impl Fn(&str) -> bool,
) -> Option<(String, usize)> {
    let mut parts: Vec<&str> = Vec::new();
    if !first.is_empty() {
        parts.push(first);
    }

    let mut j = start;
    while j < lines.len() && !is_blank(lines[j]) && !stop(lines[j]) {
        parts.push(lines[j].trim());
        j += 1;
    }

    if parts.is_empty() {
        None
    } else {
        Some((parts.join("\n"), j))
    }
}

fn line_pairs(lines: &[&str]) -> Vec<(String, String)> {
    let is_question = |line: &str| strip_tag(line, "Q:").is_some();
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(first) = strip_tag(lines[i], "Q:") else {
            i += 1;
            continue;
        };

        // The prompt may continue until the `A:` line.
        let mut prompt = vec![first];
        let mut j = i + 1;
        while j < lines.len()
            && !is_blank(lines[j])
            && strip_tag(lines[j], "A:").is_none()
            && !is_question(lines[j])
        {
            prompt.push(lines[j].trim());
            j += 1;
        }

        let answer = lines.get(j).and_then(|line| strip_tag(line, "A:"));
        match answer.and_then(|a| read_body(lines, j + 1, a, is_question)) {
            Some((answer, next)) => {
                let prompt = prompt.join("\n").trim().to_string();
                if !prompt.is_empty() {
                    pairs.push((prompt, answer));
                }
                i = next;
            }
            None => i = j.max(i + 1),
        }
    }

    pairs
}

fn headed_pairs(lines: &[&str], head: fn(&str) -> Option<&str>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(prompt) = head(lines[i]) else {
            i += 1;
            continue;
        };

        match read_body(lines, i + 1, "", |line| head(line).is_some()) {
            Some((answer, next)) => {
                pairs.push((prompt.to_string(), answer));
                i = next;
            }
            None => i += 1,
        }
    }

    pairs
}

fn header_prompt(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("##")?;
    Some(rest.trim_start_matches('#').trim()).filter(|p| !p.is_empty())
}

fn emphasis_prompt(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix("**")?.strip_suffix("**")?;
    Some(inner.trim()).filter(|p| !p.is_empty())
}

fn question_mark_prompt(line: &str) -> Option<&str> {
    Some(line.trim()).filter(|l| l.len() > 1 && l.ends_with('?'))
}

fn fallback_pairs(lines: &[&str]) -> Vec<(String, String)> {
    let non_empty: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    non_empty
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuestionKind;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_single_choice_block() {
        let input = "Q: Which battle took place in 1410?\nA) Grunwald\nB) Vienna\nC) Komarów\nD) Kircholm\nAnswer: A\n";
        let (matcher, questions) = parse_with_matcher("pl.md", input);
        assert_eq!(matcher, Some(Matcher::ChoiceBlock));
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "0");
        assert_eq!(questions[0].answer, "Grunwald");
        assert_eq!(
            questions[0].kind,
            QuestionKind::SingleChoice {
                options: strings(&["Grunwald", "Vienna", "Komarów", "Kircholm"])
            }
        );
    }

    #[test]
    fn parse_multi_choice_block_in_label_order() {
        let input = "Q: Former capitals?\nA. Kraków\nB. Warszawa\nC. Gniezno\nD. Poznań\nCorrect: C, A b\n";
        let questions = parse("pl.md", input);
        assert_eq!(questions[0].answer, "Kraków, Warszawa, Gniezno");
        assert_eq!(
            questions[0].kind,
            QuestionKind::MultiChoice {
                options: strings(&["Kraków", "Warszawa", "Gniezno", "Poznań"]),
                correct: strings(&["Kraków", "Warszawa", "Gniezno"]),
            }
        );
    }

    #[test]
    fn choice_block_with_three_options() {
        let input = "Q: Pick one\nA] first\nB] second\nC] third\nOdpowiedź: B\n";
        let questions = parse("q.md", input);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind.options().len(), 3);
        assert_eq!(questions[0].answer, "second");
    }

    #[test]
    fn choice_block_without_valid_label_is_skipped() {
        let input = "Q: First\nA) one\nB) two\nAnswer: D\n\nQ: Second\nA) three\nB) four\nAnswer: B\n";
        let questions = parse("q.md", input);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "Second");
        assert_eq!(questions[0].id, "0");
        assert_eq!(questions[0].answer, "four");
    }

    #[test]
    fn choice_block_drops_only_unknown_labels() {
        let input = "Q: Pick one\nA] x\nB] y\nC] z\nAnswer: A, D\n";
        let questions = parse("q.md", input);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answer, "x");
        assert_eq!(
            questions[0].kind,
            QuestionKind::SingleChoice {
                options: strings(&["x", "y", "z"])
            }
        );
    }

    #[test]
    fn choice_blocks_win_over_other_grammars() {
        let input = "## Heading question\nbody\n\nQ: Pick\nA) x\nB) y\nAnswer: A\n";
        let (matcher, questions) = parse_with_matcher("q.md", input);
        assert_eq!(matcher, Some(Matcher::ChoiceBlock));
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn parse_line_pairs() {
        let input = "Q: What is Rust?\nA: A systems language.\nIt has no GC.\n\nQ: Borrowing?\nA: References without ownership";
        let (matcher, questions) = parse_with_matcher("rust.md", input);
        assert_eq!(matcher, Some(Matcher::LinePair));
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].answer, "A systems language.\nIt has no GC.");
        assert_eq!(questions[1].id, "1");
        assert_eq!(questions[1].prompt, "Borrowing?");
    }

    #[test]
    fn line_pair_answer_stops_at_next_question() {
        let input = "Q: one\nA: 1\nQ: two\nA: 2";
        let questions = parse("n.md", input);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].answer, "1");
        assert_eq!(questions[1].answer, "2");
    }

    #[test]
    fn parse_header_pairs() {
        let input = "# Quiz: Polish history\n\n## First king of Poland?\nBolesław Chrobry\n\n## Baptism year?\n966\n";
        let (matcher, questions) = parse_with_matcher("pl.md", input);
        assert_eq!(matcher, Some(Matcher::Header));
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].prompt, "First king of Poland?");
        assert_eq!(questions[1].answer, "966");
    }

    #[test]
    fn parse_emphasis_pairs() {
        let input = "**Who wrote Pan Tadeusz?**\nAdam Mickiewicz\n\n**Independence year?**\n1918";
        let (matcher, questions) = parse_with_matcher("pl.md", input);
        assert_eq!(matcher, Some(Matcher::Emphasis));
        assert_eq!(questions[0].prompt, "Who wrote Pan Tadeusz?");
        assert_eq!(questions[1].answer, "1918");
    }

    #[test]
    fn parse_question_mark_pairs() {
        let input = "Capital of France?\nParis\nCapital of Italy?\nRome";
        let (matcher, questions) = parse_with_matcher("geo.md", input);
        assert_eq!(matcher, Some(Matcher::QuestionMark));
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].prompt, "Capital of Italy?");
        assert_eq!(questions[1].answer, "Rome");
    }

    #[test]
    fn fallback_pairs_non_empty_lines() {
        let input = "hello\ncześć\n\ngoodbye\nżegnaj\ndangling";
        let (matcher, questions) = parse_with_matcher("vocab.md", input);
        assert_eq!(matcher, Some(Matcher::LineFallback));
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].id, "1");
        assert_eq!(questions[1].prompt, "goodbye");
        assert_eq!(questions[1].answer, "żegnaj");
    }

    #[test]
    fn empty_content_has_no_questions() {
        assert_eq!(parse_with_matcher("e.md", "\n  \n"), (None, vec![]));
    }

    #[test]
    fn option_line_styles() {
        assert_eq!(option_line("A) x"), Some(('A', "x")));
        assert_eq!(option_line("  B. y "), Some(('B', "y")));
        assert_eq!(option_line("C]z"), Some(('C', "z")));
        assert_eq!(option_line("A: x"), None);
        assert_eq!(option_line("E) x"), None);
    }

    #[test]
    fn answer_line_letters() {
        assert_eq!(answer_letters("Answer: A, B C"), Some(vec!['A', 'B', 'C']));
        assert_eq!(answer_letters("Poprawna: d"), Some(vec!['D']));
        assert_eq!(answer_letters("Answer: Paris"), None);
        assert_eq!(answer_letters("Hint: A"), None);
    }
}
