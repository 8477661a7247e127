//! Quiz source parsing.
//!
//! Two source kinds are supported:
//! - structured (`.json`): a list of question objects, an object with a
//!   `questions` list, or a flat `{"prompt": "answer"}` mapping
//! - loosely structured (`.md`, `.markdown`, `.txt`): line-oriented text,
//!   see [`loose`] for the accepted block grammars
//!
//! Parsing is pure: the same content always yields the same questions in
//! the same order.

pub mod loose;
pub mod structured;

use crate::error::{FormatError, Result};
use crate::types::Question;
use std::fs;
use std::path::{Path, PathBuf};

/// How a source's content is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Structured,
    Loose,
}

impl SourceKind {
    /// Pick the kind from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Structured),
            "md" | "markdown" | "txt" => Ok(Self::Loose),
            _ => Err(FormatError::UnsupportedKind(ext)),
        }
    }
}

/// Raw source content with its identifier.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub kind: SourceKind,
    pub content: String,
}

impl Source {
    pub fn new(id: impl Into<String>, kind: SourceKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
        }
    }

    /// Read a source file. The path doubles as the source id.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let kind = SourceKind::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| FormatError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.to_string_lossy(), kind, content))
    }
}

/// Parse a source into questions.
pub fn parse(source: &Source) -> Result<Vec<Question>> {
    let questions = match source.kind {
        SourceKind::Structured => structured::parse(&source.id, &source.content)?,
        SourceKind::Loose => loose::parse(&source.id, &source.content),
    };
    tracing::debug!(source = %source.id, count = questions.len(), "parsed source");
    Ok(questions)
}

/// Read and parse a source file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Question>> {
    parse(&Source::read(path)?)
}

/// List quiz files (`.json`, `.md`) in a directory, sorted by path.
///
/// A missing directory yields an empty list.
pub fn discover_sources<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_quiz = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json") || e.eq_ignore_ascii_case("md"));
        if is_quiz && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
