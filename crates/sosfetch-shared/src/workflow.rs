//! End-to-end flow for one dump: inspect, validate, resolve, launch.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::Result;
use crate::launch::{Debugger, DebuggerCommand};
use crate::locator::{Locator, Resolution};
use crate::runtime::{Bitness, ClrVersion, DumpInfo};
use crate::symbols::SymbolService;
use crate::validate::{Rejection, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fetch support files and report where they are.
    Download,
    /// Fetch support files if needed, then open the dump in the debugger.
    Launch,
}

/// Reads runtime information out of a dump.
pub trait DumpInspector {
    fn inspect(&self, dump: &Path) -> Result<DumpInfo>;
}

#[derive(Debug, Clone)]
pub struct Request {
    pub mode: Mode,
    pub dump: PathBuf,
    /// Explicit cache directory, `<temp>/<version>` when `None`.
    pub storage_location: Option<PathBuf>,
    pub host: Bitness,
}

impl Request {
    pub fn new(mode: Mode, dump: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            dump: dump.into(),
            storage_location: None,
            host: Bitness::current(),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// The dump cannot be handled; nothing was fetched.
    Rejected(Rejection),
    /// A matching DAC is already on this machine.
    Local {
        version: ClrVersion,
        dac_location: PathBuf,
        launched: Option<DebuggerCommand>,
    },
    /// Support files were fetched into a cache directory.
    Resolved {
        version: ClrVersion,
        resolution: Resolution,
        launched: Option<DebuggerCommand>,
    },
}

/// Run the whole flow for `request`.
pub fn run<I, S, D>(
    request: &Request,
    inspector: &I,
    locator: &Locator<S>,
    debugger: &D,
) -> Result<Outcome>
where
    I: DumpInspector,
    S: SymbolService,
    D: Debugger,
{
    let dump = inspector.inspect(&request.dump)?;
    let runtime = match validate(&dump, request.host) {
        Ok(runtime) => runtime,
        Err(rejection) => {
            info!(%rejection, "dump rejected");
            return Ok(Outcome::Rejected(rejection));
        }
    };

    info!(version = %runtime.version, architecture = %dump.architecture, "found CLR");

    if let Some(dac_location) = &runtime.local_matching_dac {
        info!(dac = %dac_location.display(), "support files are available locally");
        let launched = launch_if_requested(request, debugger, || {
            DebuggerCommand::for_local_runtime(runtime.version)
        })?;
        return Ok(Outcome::Local {
            version: runtime.version,
            dac_location: dac_location.clone(),
            launched,
        });
    }

    let resolution = locator.resolve(
        runtime,
        dump.architecture,
        request.storage_location.as_deref(),
    )?;
    let launched = launch_if_requested(request, debugger, || {
        DebuggerCommand::for_directory(&resolution.directory)
    })?;

    Ok(Outcome::Resolved {
        version: runtime.version,
        resolution,
        launched,
    })
}

fn launch_if_requested<D: Debugger>(
    request: &Request,
    debugger: &D,
    command: impl FnOnce() -> DebuggerCommand,
) -> Result<Option<DebuggerCommand>> {
    if request.mode != Mode::Launch {
        return Ok(None);
    }
    let command = command();
    debugger.launch(&request.dump, &command)?;
    Ok(Some(command))
}
