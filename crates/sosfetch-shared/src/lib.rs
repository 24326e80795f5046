//! Shared types and the support file locator for sosfetch.
//!
//! # Architecture
//!
//! - [`workflow::run`] drives one dump: inspect, validate, resolve, launch
//! - [`Locator`] fetches the SOS, DAC and core library files through a
//!   [`SymbolService`] and copies them into a per-version cache directory
//! - [`SupportFileSet`] derives the file names from a [`ClrRuntime`]

pub mod error;
pub mod launch;
pub mod locator;
pub mod runtime;
pub mod support;
pub mod symbols;
pub mod validate;
pub mod workflow;

pub use error::{Error, Result};
pub use launch::{Debugger, DebuggerCommand, debugger_arguments};
pub use locator::{
    Completeness, FileOutcome, Locator, Resolution, ResolvedFile, RetryPolicy,
    default_storage_location,
};
pub use runtime::{Architecture, Bitness, ClrRuntime, ClrVersion, DacInfo, DumpInfo};
pub use support::{
    DAC_FILE_NAME, SOS_FILE_NAME, SupportFile, SupportFileKind, SupportFileSet,
    core_library_name, sos_file_name,
};
pub use symbols::{FileIdentity, LookupError, SymbolService, SymbolSession};
pub use validate::{Rejection, validate};
pub use workflow::{DumpInspector, Mode, Outcome, Request};

/// Extension that marks a command line argument as a dump path.
pub const DUMP_FILE_EXTENSION: &str = "dmp";
