use anyhow::Result;
use quiz_core::{QuizStatistics, ReviewStore};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, source: Option<&str>, format: OutputFormat) -> Result<()> {
    let stats = app.repository.get_statistics(source)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => print!("{}", render(&stats)),
    }
    Ok(())
}

pub fn render(stats: &QuizStatistics) -> String {
    let latency = stats
        .average_latency
        .map(|secs| format!("{secs:.1}s"))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Questions:       {} ({} learned)\n\
         Answers:         {} ({} correct, {:.1}%)\n\
         Avg. latency:    {}\n\
         Avg. difficulty: {:.2}\n",
        stats.total_questions,
        stats.learned_questions,
        stats.total_answers,
        stats.correct_answers,
        stats.accuracy,
        latency,
        stats.average_difficulty,
    )
}
