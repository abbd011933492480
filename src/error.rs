//! Error types for execdiff.
//!
//! Only precondition violations and history read failures reach callers.
//! Capture and append are best-effort and never produce these.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no active trace for {0}, run `execdiff start` first")]
    NoActiveTrace(PathBuf),

    #[error("workspace {0} is not a directory")]
    WorkspaceNotFound(PathBuf),

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("corrupt history entry at line {line}: {source}")]
    CorruptEntry {
        line: usize,
        source: serde_json::Error,
    },

    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] humantime::DurationError),
}

pub type Result<T> = std::result::Result<T, Error>;
