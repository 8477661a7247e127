use anyhow::Result;
use std::path::Path;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, path: &Path, format: OutputFormat) -> Result<()> {
    let outcomes = app.import_path(path)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        OutputFormat::Plain => {
            for outcome in &outcomes {
                match &outcome.error {
                    Some(error) => println!("  {}: skipped ({})", outcome.source, error),
                    None => println!("  {}: {} questions", outcome.source, outcome.imported),
                }
            }
            let total: usize = outcomes.iter().map(|o| o.imported).sum();
            println!("Imported {} questions from {} sources.", total, outcomes.len());
        }
    }
    Ok(())
}
