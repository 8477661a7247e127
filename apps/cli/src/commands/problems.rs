use anyhow::Result;
use quiz_core::{ProblemQuestion, ReviewStore};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, source: Option<&str>, limit: usize, format: OutputFormat) -> Result<()> {
    let problems = app.repository.get_problem_questions(source, limit)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&problems)?),
        OutputFormat::Plain => print!("{}", render(&problems)),
    }
    Ok(())
}

pub fn render(problems: &[ProblemQuestion]) -> String {
    if problems.is_empty() {
        return "No problem questions yet (each needs at least 3 answers).\n".to_string();
    }

    let mut out = String::new();
    for (rank, p) in problems.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {} -> {}\n    {}/{} correct ({:.0}%)\n",
            rank + 1,
            p.prompt,
            p.answer,
            p.correct,
            p.attempts,
            p.accuracy * 100.0,
        ));
    }
    out
}
