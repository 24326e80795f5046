//! Debugger command composition.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::runtime::ClrVersion;

/// Initial command passed to the debugger with `-c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebuggerCommand {
    /// Load SOS from next to the runtime module (support files are local).
    LoadBy { module: &'static str },
    /// Load SOS and the DAC from a resolved cache directory.
    LoadFrom { directory: PathBuf },
}

impl DebuggerCommand {
    pub fn for_local_runtime(version: ClrVersion) -> Self {
        let module = if version.major == 4 { "clr" } else { "mscorwks" };
        DebuggerCommand::LoadBy { module }
    }

    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        DebuggerCommand::LoadFrom {
            directory: directory.into(),
        }
    }
}

impl fmt::Display for DebuggerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebuggerCommand::LoadBy { module } => write!(f, ".loadby sos {module}"),
            DebuggerCommand::LoadFrom { directory } => write!(
                f,
                ".load {}; .cordll -se -lp {}",
                directory.join("sos").display(),
                directory.display()
            ),
        }
    }
}

/// Arguments for opening `dump` and running `command` on start.
pub fn debugger_arguments(dump: &Path, command: &DebuggerCommand) -> Vec<String> {
    vec![
        "-z".to_string(),
        dump.display().to_string(),
        "-c".to_string(),
        command.to_string(),
    ]
}

/// Something that can open a dump in an interactive debugger.
pub trait Debugger {
    fn launch(&self, dump: &Path, command: &DebuggerCommand) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loadby_module() {
        assert_eq!(
            DebuggerCommand::for_local_runtime(ClrVersion::new(4, 8, 9032, 0)).to_string(),
            ".loadby sos clr"
        );
        assert_eq!(
            DebuggerCommand::for_local_runtime(ClrVersion::new(2, 0, 50727, 8762)).to_string(),
            ".loadby sos mscorwks"
        );
    }

    #[test]
    fn test_load_from_directory() {
        let directory = Path::new("cache").join("v4.6.1.00");
        let command = DebuggerCommand::for_directory(&directory);
        assert_eq!(
            command.to_string(),
            format!(
                ".load {}; .cordll -se -lp {}",
                directory.join("sos").display(),
                directory.display()
            )
        );
    }

    #[test]
    fn test_debugger_arguments() {
        let command = DebuggerCommand::LoadBy { module: "clr" };
        let args = debugger_arguments(Path::new("crash.dmp"), &command);
        assert_eq!(args, ["-z", "crash.dmp", "-c", ".loadby sos clr"]);
    }
}
