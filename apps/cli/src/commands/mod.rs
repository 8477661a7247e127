//! Subcommand implementations.

pub mod import;
pub mod problems;
pub mod sources;
pub mod stats;
pub mod study;
