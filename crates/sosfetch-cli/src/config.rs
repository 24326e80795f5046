//! Command line and environment configuration.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use sosfetch_shared::{Completeness, DUMP_FILE_EXTENSION, Mode, RetryPolicy};

use crate::debugger::DEFAULT_DEBUGGER;
use crate::logging::LogFormat;
use crate::symsrv::DEFAULT_SYMBOL_SERVER;

const SUBCOMMANDS: [&str; 3] = ["download", "launch", "help"];

pub const USAGE: &str = "Usage: sosfetch <download | launch> <dump file path>";

#[derive(Parser, Debug)]
#[command(name = "sosfetch", version)]
#[command(about = "Fetch the SOS, DAC and CLR binaries matching a crash dump and open it in WinDbg")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Symbol lookup client (default: dbghelp on Windows, http elsewhere)
    #[arg(long, value_enum, env = "SOSFETCH_BACKEND", global = true)]
    pub backend: Option<Backend>,

    /// Symbol store root used by the http backend
    #[arg(long, env = "SOSFETCH_SYMBOL_SERVER", default_value = DEFAULT_SYMBOL_SERVER, global = true)]
    pub symbol_server: String,

    /// Search path handed to dbghelp
    #[arg(long, env = "_NT_SYMBOL_PATH", global = true)]
    pub symbol_path: Option<String>,

    /// Directory for the support files (default: <temp>/<clr version>)
    #[arg(long, env = "SOSFETCH_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Debugger executable used by `launch`
    #[arg(long, env = "SOSFETCH_DEBUGGER", default_value = DEFAULT_DEBUGGER, global = true)]
    pub debugger: PathBuf,

    /// Lookup attempts per file before giving up
    #[arg(
        long,
        default_value_t = RetryPolicy::DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..),
        global = true
    )]
    pub max_attempts: u32,

    /// Delay between lookup attempts, in milliseconds
    #[arg(long, default_value_t = 10, global = true)]
    pub retry_delay_ms: u64,

    /// Fail if any support file could not be fetched
    #[arg(long, global = true)]
    pub require_all: bool,

    /// Wait for Enter before exiting
    #[arg(long, global = true)]
    pub pause: bool,

    /// Log filter, e.g. `debug` or `sosfetch_shared=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[arg(long, value_enum, env = "SOSFETCH_LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the support files and print where they were stored
    Download {
        /// Path to the dump file
        dump: PathBuf,
    },
    /// Fetch the support files if needed and open the dump in the debugger
    Launch {
        /// Path to the dump file
        dump: PathBuf,
    },
}

impl Commands {
    pub fn target(&self) -> (Mode, &Path) {
        match self {
            Commands::Download { dump } => (Mode::Download, dump),
            Commands::Launch { dump } => (Mode::Launch, dump),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Plain HTTP symbol store (SSQP layout)
    Http,
    /// dbghelp.dll + symsrv.dll
    Dbghelp,
}

impl Backend {
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Backend::Dbghelp
        } else {
            Backend::Http
        }
    }
}

impl Cli {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::platform_default)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn completeness(&self) -> Completeness {
        if self.require_all {
            Completeness::RequireAll
        } else {
            Completeness::BestEffort
        }
    }
}

/// Whether `arg` names a dump file.
pub fn is_dump_path(arg: &OsStr) -> bool {
    Path::new(arg)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DUMP_FILE_EXTENSION))
}

/// Turn `sosfetch [options] crash.dmp [options]` into
/// `sosfetch [options] launch crash.dmp [options]`.
///
/// Left alone when a subcommand is already named.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let rest = args.get(1..).unwrap_or_default();
    if rest.iter().any(|arg| SUBCOMMANDS.iter().any(|name| arg == *name)) {
        return args;
    }
    if let Some(position) = rest.iter().position(|arg| is_dump_path(arg)) {
        args.insert(position + 1, OsString::from("launch"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn test_dump_path_shorthand() {
        let args = normalize_args(["sosfetch", r"C:\dumps\w3wp.DMP"]);
        assert_eq!(args, ["sosfetch", "launch", r"C:\dumps\w3wp.DMP"]);

        let cli = parse(&["sosfetch", "crash.dmp"]).unwrap();
        assert_eq!(cli.command.target(), (Mode::Launch, Path::new("crash.dmp")));
    }

    #[test]
    fn test_dump_path_shorthand_after_options() {
        let args = normalize_args(["sosfetch", "--pause", "crash.dmp"]);
        assert_eq!(args, ["sosfetch", "--pause", "launch", "crash.dmp"]);

        let cli = parse(&["sosfetch", "--pause", "--backend", "http", "crash.dmp"]).unwrap();
        assert!(cli.pause);
        assert_eq!(cli.backend(), Backend::Http);
        assert_eq!(cli.command.target(), (Mode::Launch, Path::new("crash.dmp")));

        let cli = parse(&["sosfetch", "crash.dmp", "--pause"]).unwrap();
        assert!(cli.pause);
    }

    #[test]
    fn test_named_subcommand_is_kept() {
        let args = normalize_args(["sosfetch", "--pause", "download", "crash.dmp"]);
        assert_eq!(args, ["sosfetch", "--pause", "download", "crash.dmp"]);
    }

    #[test]
    fn test_subcommands() {
        let cli = parse(&["sosfetch", "download", "crash.dmp"]).unwrap();
        assert_eq!(cli.command.target(), (Mode::Download, Path::new("crash.dmp")));

        let cli = parse(&["sosfetch", "launch", "other.mdmp"]).unwrap();
        assert_eq!(cli.command.target(), (Mode::Launch, Path::new("other.mdmp")));
    }

    #[test]
    fn test_other_shapes_are_rejected() {
        assert!(parse(&["sosfetch"]).is_err());
        assert!(parse(&["sosfetch", "crash.txt"]).is_err());
        assert!(parse(&["sosfetch", "upload", "crash.dmp"]).is_err());
        assert!(parse(&["sosfetch", "download"]).is_err());
        assert!(parse(&["sosfetch", "download", "a.dmp", "b.dmp"]).is_err());
    }

    #[test]
    fn test_is_dump_path() {
        assert!(is_dump_path(OsStr::new("a.dmp")));
        assert!(is_dump_path(OsStr::new("A.Dmp")));
        assert!(!is_dump_path(OsStr::new("download")));
        assert!(!is_dump_path(OsStr::new("dmp")));
    }

    #[test]
    fn test_retry_options() {
        let cli = parse(&[
            "sosfetch",
            "download",
            "crash.dmp",
            "--max-attempts",
            "5",
            "--retry-delay-ms",
            "0",
            "--require-all",
        ])
        .unwrap();
        assert_eq!(cli.retry_policy(), RetryPolicy::new(5, Duration::ZERO));
        assert_eq!(cli.completeness(), Completeness::RequireAll);

        assert!(parse(&["sosfetch", "download", "crash.dmp", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_backend_selection() {
        let cli = parse(&["sosfetch", "download", "crash.dmp", "--backend", "http"]).unwrap();
        assert_eq!(cli.backend(), Backend::Http);
    }
}
