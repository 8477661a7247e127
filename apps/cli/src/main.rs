mod app;
mod commands;
mod config;
mod db;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use commands::study::{Mode, StudyOptions};
use config::Config;

#[derive(Parser)]
#[command(name = "quiz", about = "Spaced-repetition quiz trainer", version)]
struct Cli {
    /// SQLite database file (overrides QUIZ_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Directory scanned for quiz files (overrides QUIZ_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List quiz files and the sources stored in the database
    Sources,

    /// Import a quiz file, or every quiz file in a directory
    Import {
        path: PathBuf,
    },

    /// Run a study session
    Study {
        #[arg(long, value_enum, default_value = "review")]
        mode: Mode,
        /// Only ask questions from this source
        #[arg(long)]
        source: Option<String>,
        /// Questions per session (overrides QUIZ_MAX_QUESTIONS)
        #[arg(long, value_name = "N")]
        max: Option<usize>,
    },

    /// Show answer statistics
    Stats {
        #[arg(long)]
        source: Option<String>,
    },

    /// List the questions answered worst
    Problems {
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(dir) = cli.dir {
        config.quiz_dir = dir;
    }

    let mut app = App::open(config)?;

    match cli.command {
        Command::Sources => commands::sources::run(&app, cli.format)?,
        Command::Import { path } => commands::import::run(&mut app, &path, cli.format)?,
        Command::Study { mode, source, max } => {
            commands::study::run(&mut app, StudyOptions { mode, source, max }, cli.format)?
        }
        Command::Stats { source } => commands::stats::run(&app, source.as_deref(), cli.format)?,
        Command::Problems { source, limit } => {
            commands::problems::run(&app, source.as_deref(), limit, cli.format)?
        }
    }

    Ok(())
}
