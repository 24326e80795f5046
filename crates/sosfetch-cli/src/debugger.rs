//! Launching WinDbg against a dump.

use std::path::{Path, PathBuf};
use std::process::Command;

use sosfetch_shared::{Debugger, DebuggerCommand, Error, Result, debugger_arguments};
use tracing::info;

pub const DEFAULT_DEBUGGER: &str = r"C:\Program Files\Debugging Tools for Windows (x64)\windbg.exe";

/// Debugger started as a detached child process.
#[derive(Debug, Clone)]
pub struct ProcessDebugger {
    executable: PathBuf,
}

impl ProcessDebugger {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Command line as a user would type it.
    pub fn command_line(&self, dump: &Path, command: &DebuggerCommand) -> String {
        format!(
            "{} -z {} -c \"{}\"",
            self.executable.display(),
            dump.display(),
            command
        )
    }
}

impl Debugger for ProcessDebugger {
    fn launch(&self, dump: &Path, command: &DebuggerCommand) -> Result<()> {
        println!(
            "Launching {} with the provided dump file...",
            self.executable.display()
        );
        println!();
        println!("start>: {}", self.command_line(dump, command));

        let child = Command::new(&self.executable)
            .args(debugger_arguments(dump, command))
            .spawn()
            .map_err(|source| Error::DebuggerLaunch {
                path: self.executable.clone(),
                source,
            })?;

        info!(pid = child.id(), "debugger started");
        Ok(())
    }
}
