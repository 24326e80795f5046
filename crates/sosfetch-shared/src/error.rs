//! Error types for sosfetch.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to initialize symbol support: {0}")]
    SymbolInit(String),

    #[error("Failed to read dump {path}: {reason}")]
    DumpRead { path: PathBuf, reason: String },

    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Support files in {directory} are incomplete, missing: {}", missing.join(", "))]
    Incomplete {
        directory: PathBuf,
        missing: Vec<String>,
    },

    #[error("Failed to launch debugger {path}: {source}")]
    DebuggerLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
