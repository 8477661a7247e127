//! Interactive study sessions on the terminal.

use anyhow::{ensure, Result};
use quiz_core::matching::MatchKind;
use quiz_core::{
    Checked, Prompter, QuestionKind, SessionConfig, SessionCoordinator, SessionEnd, SessionReport,
    StoredQuestion, StudyMode, Submission,
};
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use crate::app::App;
use crate::OutputFormat;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Mode {
    /// Earliest-due questions first
    Review,
    /// Random due questions, or any question when nothing is due
    Random,
}

impl From<Mode> for StudyMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Review => StudyMode::Review,
            Mode::Random => StudyMode::Random,
        }
    }
}

/// Reads answers line by line and prints questions and verdicts.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

fn option_label(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(
        &mut self,
        question: &StoredQuestion,
        position: usize,
        total: usize,
    ) -> io::Result<Option<Submission>> {
        writeln!(self.output)?;
        writeln!(self.output, "[{position}/{total}] {}", question.question.prompt)?;
        for (i, option) in question.question.kind.options().iter().enumerate() {
            writeln!(self.output, "  {}) {}", option_label(i), option)?;
        }
        if matches!(question.question.kind, QuestionKind::MultiChoice { .. }) {
            writeln!(self.output, "  (select all that apply, separated by commas)")?;
        }
        write!(self.output, "> ")?;
        self.output.flush()?;

        let started = Instant::now();
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let text = line.trim_end_matches(&['\r', '\n'][..]);
        Ok(Some(Submission::new(text).with_latency(started.elapsed())))
    }

    fn show_verdict(&mut self, question: &StoredQuestion, checked: &Checked) -> io::Result<()> {
        let verdict = &checked.verdict;
        match (verdict.is_correct, verdict.match_kind, verdict.coverage) {
            (true, MatchKind::Partial, Some(coverage)) => writeln!(
                self.output,
                "Correct (partial match, {:.0}% of the answer). Full answer: {}",
                coverage * 100.0,
                question.question.answer
            )?,
            (true, _, _) => writeln!(self.output, "Correct!")?,
            (false, _, _) => writeln!(
                self.output,
                "Wrong. Correct answer: {}",
                question.question.answer
            )?,
        }
        let days = checked.recorded.state.interval_days;
        writeln!(
            self.output,
            "Next review in {} day{}.",
            days,
            if days == 1 { "" } else { "s" }
        )
    }

    fn show_skipped(&mut self, _question: &StoredQuestion) -> io::Result<()> {
        writeln!(self.output, "Skipped.")
    }
}

pub struct StudyOptions {
    pub mode: Mode,
    pub source: Option<String>,
    pub max: Option<usize>,
}

pub fn run(app: &mut App, options: StudyOptions, format: OutputFormat) -> Result<()> {
    let max_questions = options.max.unwrap_or(app.config.max_questions);
    ensure!(max_questions > 0, "--max must be at least 1");

    // Pick up new or edited files before selecting questions.
    let quiz_dir = app.config.quiz_dir.clone();
    app.import_dir(&quiz_dir)?;

    let config = SessionConfig {
        mode: options.mode.into(),
        source: options.source,
        max_questions,
    };

    let stdin = io::stdin();
    let mut prompter = TerminalPrompter::new(stdin.lock(), io::stdout());
    println!("Type `skip` to skip a question and `quit` to stop.");
    let report = SessionCoordinator::new(&mut app.repository, &app.scheduler, config)
        .run(&mut prompter, &mut rand::thread_rng())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print!("{}", render_report(&report)),
    }
    Ok(())
}

pub fn render_report(report: &SessionReport) -> String {
    let headline = match report.end {
        SessionEnd::CapReached => "Session complete.",
        SessionEnd::CaughtUp => "All caught up! Nothing else is due right now.",
        SessionEnd::NoQuestions => "No questions loaded. Import a quiz with `quiz import <path>`.",
        SessionEnd::Quit => "Session ended.",
    };

    let stats = &report.stats;
    if stats.asked == 0 {
        return format!("\n{headline}\n");
    }
    format!(
        "\n{headline}\nAsked:   {} ({} skipped)\nCorrect: {}/{} ({:.1}%)\nTime:    {}\n",
        stats.asked,
        stats.skipped,
        stats.correct,
        stats.answered,
        stats.accuracy,
        format_elapsed(stats.elapsed),
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app;
    use pretty_assertions::assert_eq;
    use quiz_core::{register_all, Question, ReviewStore, SessionSnapshot};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn run_script(app: &mut App, input: &str) -> (SessionReport, String) {
        let mut prompter = TerminalPrompter::new(Cursor::new(input.to_string()), Vec::new());
        let report = SessionCoordinator::new(&mut app.repository, &app.scheduler, SessionConfig::default())
            .run(&mut prompter, &mut StdRng::seed_from_u64(1))
            .unwrap();
        (report, String::from_utf8(prompter.output).unwrap())
    }

    #[test]
    fn test_terminal_session() {
        let mut app = test_app();
        let questions = vec![
            Question::single_choice(
                "geo",
                "1",
                "Capital of France?",
                "Paris",
                vec!["Paris".into(), "London".into(), "Rome".into()],
            ),
            Question::free_text("vocab", "2", "house", "dom"),
            Question::free_text("vocab", "3", "dog", "pies"),
        ];
        register_all(&mut app.repository, &app.scheduler, &questions).unwrap();

        let (report, output) = run_script(&mut app, "a\r\nPOMIŃ\nkot\n");

        assert_eq!(report.end, SessionEnd::CaughtUp);
        assert_eq!(report.stats.asked, 3);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.correct, 1);
        assert!(output.contains("[1/20] Capital of France?\n  A) Paris\n  B) London\n  C) Rome\n> "));
        assert!(output.contains("Correct!\nNext review in 1 day.\n"));
        assert!(output.contains("Skipped.\n"));
        assert!(output.contains("Wrong. Correct answer: pies\n"));
        assert!(app.repository.answers_for(2).unwrap().is_empty());
    }

    #[test]
    fn test_multi_choice_hint_and_partial_verdict() {
        let mut app = test_app();
        let questions = vec![
            Question::multi_choice(
                "py",
                "1",
                "Python types?",
                vec!["int".into(), "array".into()],
                vec!["int".into()],
            ),
            Question::free_text("s", "2", "Pangram?", "the quick brown fox jumps"),
        ];
        register_all(&mut app.repository, &app.scheduler, &questions).unwrap();

        let (_, output) = run_script(&mut app, "A\nquick brown fox jumps\n");

        assert!(output.contains("(select all that apply, separated by commas)"));
        assert!(output.contains("Correct (partial match, 80% of the answer)"));
    }

    #[test]
    fn test_render_report() {
        let report = SessionReport {
            end: SessionEnd::CapReached,
            stats: SessionSnapshot {
                asked: 20,
                answered: 18,
                correct: 9,
                skipped: 2,
                accuracy: 50.0,
                elapsed: Duration::from_secs(125),
            },
        };
        assert_eq!(
            render_report(&report),
            "\nSession complete.\nAsked:   20 (2 skipped)\nCorrect: 9/18 (50.0%)\nTime:    2m 5s\n"
        );

        let empty = SessionReport {
            end: SessionEnd::NoQuestions,
            stats: SessionSnapshot {
                asked: 0,
                answered: 0,
                correct: 0,
                skipped: 0,
                accuracy: 0.0,
                elapsed: Duration::ZERO,
            },
        };
        assert!(render_report(&empty).contains("quiz import"));
    }
}
