//! Shared state for CLI commands.

use crate::config::Config;
use crate::db::SqliteRepository;
use anyhow::{Context, Result};
use quiz_core::{discover_sources, parse_file, register_all, Scheduler};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Result of importing one source file.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub source: String,
    pub imported: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct App {
    pub config: Config,
    pub repository: SqliteRepository,
    pub scheduler: Scheduler,
}

impl App {
    /// Open the database named by `config`, creating its directory if needed.
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create data directory {}", parent.display())
                })?;
            }
        }

        let repository = SqliteRepository::open(&config.db_path)
            .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
        tracing::debug!(db = %config.db_path.display(), "database opened");

        Ok(Self {
            config,
            repository,
            scheduler: Scheduler::system(),
        })
    }

    /// Import a single source file.
    pub fn import_file(&mut self, path: &Path) -> Result<ImportOutcome> {
        let questions =
            parse_file(path).with_context(|| format!("failed to load {}", path.display()))?;
        let ids = register_all(&mut self.repository, &self.scheduler, &questions)?;
        Ok(ImportOutcome {
            source: path.to_string_lossy().to_string(),
            imported: ids.len(),
            error: None,
        })
    }

    /// Import every quiz file of a directory.
    ///
    /// A source that fails to parse is reported and skipped; store failures abort.
    pub fn import_dir(&mut self, dir: &Path) -> Result<Vec<ImportOutcome>> {
        let paths = discover_sources(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?;

        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let source = path.to_string_lossy().to_string();
            match parse_file(&path) {
                Ok(questions) => {
                    let ids = register_all(&mut self.repository, &self.scheduler, &questions)?;
                    outcomes.push(ImportOutcome {
                        source,
                        imported: ids.len(),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "skipping unreadable source");
                    outcomes.push(ImportOutcome {
                        source,
                        imported: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    /// Import a file or a directory.
    pub fn import_path(&mut self, path: &Path) -> Result<Vec<ImportOutcome>> {
        if path.is_dir() {
            self.import_dir(path)
        } else {
            Ok(vec![self.import_file(path)?])
        }
    }
}

/// App over an in-memory database with a manual clock.
#[cfg(test)]
pub(crate) fn test_app() -> App {
    use quiz_core::ManualClock;
    use std::path::PathBuf;

    App {
        config: Config {
            db_path: PathBuf::from(":memory:"),
            quiz_dir: PathBuf::from("quizzes"),
            max_questions: 20,
        },
        repository: SqliteRepository::open_in_memory().expect("in-memory database"),
        scheduler: Scheduler::new(ManualClock::new(chrono::Utc::now())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiz_core::ReviewStore;

    #[test]
    fn test_import_dir_skips_broken_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "Q: dog\nA: pies\n\nQ: cat\nA: kot\n").unwrap();
        fs::write(dir.path().join("b.json"), "42").unwrap();

        let mut app = test_app();
        let outcomes = app.import_dir(dir.path()).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].imported, 2);
        assert!(outcomes[0].error.is_none());
        assert_eq!(outcomes[1].imported, 0);
        assert!(outcomes[1].error.is_some());
        assert_eq!(app.repository.list_questions(None).unwrap().len(), 2);
    }

    #[test]
    fn test_import_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        fs::write(&path, "whatever").unwrap();

        let mut app = test_app();
        assert!(app.import_path(&path).is_err());
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        fs::write(&path, r#"{"hello": "cześć", "goodbye": "żegnaj"}"#).unwrap();

        let mut app = test_app();
        app.import_path(&path).unwrap();
        let outcomes = app.import_path(&path).unwrap();
        assert_eq!(outcomes[0].imported, 2);
        assert_eq!(app.repository.list_questions(None).unwrap().len(), 2);
    }

    #[test]
    fn test_open_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("quiz.db");
        let config = Config {
            db_path: db_path.clone(),
            quiz_dir: dir.path().to_path_buf(),
            max_questions: 20,
        };
        App::open(config).unwrap();
        assert!(db_path.exists());
    }
}
