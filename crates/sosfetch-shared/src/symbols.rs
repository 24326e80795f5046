//! Symbol lookup abstraction.
//!
//! A [`SymbolService`] hands out a [`SymbolSession`] for the duration of one
//! locator run. Dropping the session releases whatever the backend acquired
//! (dbghelp state, staging directories), so cleanup happens on every exit
//! path.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::Result;

/// Symbol server identity of a binary: name, PE time stamp and image size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub file_name: String,
    pub time_stamp: u32,
    pub file_size: u32,
}

impl FileIdentity {
    /// Index key used by symbol stores, e.g. `5A100000100000`.
    pub fn index_key(&self) -> String {
        format!("{:08X}{:x}", self.time_stamp, self.file_size)
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name, self.index_key())
    }
}

/// A single failed lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (error code {code})")]
pub struct LookupError {
    /// Platform error code (Win32 error, HTTP status, ...). Zero when unknown.
    pub code: i64,
    pub message: String,
}

impl LookupError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Entry point to a symbol lookup backend.
pub trait SymbolService {
    type Session: SymbolSession;

    /// Acquire the backend for one run. Failing here is a local
    /// environment problem and is not retried.
    fn initialize(&self) -> Result<Self::Session>;
}

/// An initialized backend. Released when dropped.
pub trait SymbolSession {
    /// Find the file matching `identity` and return a local path to it.
    fn find_file(&mut self, identity: &FileIdentity) -> std::result::Result<PathBuf, LookupError>;
}
