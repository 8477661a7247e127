use anyhow::{Context, Result};
use quiz_core::{discover_sources, ReviewStore};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app::App;
use crate::OutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRow {
    pub source: String,
    /// Questions registered in the database.
    pub questions: usize,
    /// Whether the file is in the quiz directory.
    pub on_disk: bool,
}

/// Quiz files in the quiz directory merged with sources known to the database.
pub fn collect(app: &App) -> Result<Vec<SourceRow>> {
    let mut rows: BTreeMap<String, SourceRow> = BTreeMap::new();

    let files = discover_sources(&app.config.quiz_dir)
        .with_context(|| format!("failed to list {}", app.config.quiz_dir.display()))?;
    for path in files {
        let source = path.to_string_lossy().to_string();
        rows.insert(
            source.clone(),
            SourceRow {
                source,
                questions: 0,
                on_disk: true,
            },
        );
    }

    for source in app.repository.list_sources()? {
        let questions = app.repository.list_questions(Some(source.as_str()))?.len();
        rows.entry(source.clone())
            .or_insert_with(|| SourceRow {
                source,
                questions: 0,
                on_disk: false,
            })
            .questions = questions;
    }

    Ok(rows.into_values().collect())
}

pub fn run(app: &App, format: OutputFormat) -> Result<()> {
    let rows = collect(app)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No quiz sources in {}.", app.config.quiz_dir.display());
            }
            for row in &rows {
                let status = match (row.on_disk, row.questions) {
                    (true, 0) => "not imported".to_string(),
                    (true, n) => format!("{n} questions"),
                    (false, n) => format!("{n} questions, file missing"),
                };
                println!("  {} ({})", row.source, status);
            }
        }
    }
    Ok(())
}
