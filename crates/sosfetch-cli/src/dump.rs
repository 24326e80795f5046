//! Runtime discovery in minidumps.
//!
//! Finds the desktop CLR modules (`clr.dll`, `mscorwks.dll`) in the module
//! list and turns each into a [`ClrRuntime`]. The DAC for a desktop CLR is
//! indexed on the symbol server under the runtime module's own time stamp
//! and image size.

use std::path::{Path, PathBuf};

use minidump::system_info::Cpu;
use minidump::{Minidump, MinidumpModuleList, MinidumpSystemInfo};
use sosfetch_shared::{
    Architecture, ClrRuntime, ClrVersion, DAC_FILE_NAME, DacInfo, DumpInfo, DumpInspector, Error,
    Result,
};
use tracing::{debug, warn};

use crate::pe::read_image_identity;

/// `VS_FIXEDFILEINFO` signature.
const VS_FFI_SIGNATURE: u32 = 0xFEEF_04BD;

const RUNTIME_MODULES: [&str; 2] = ["clr.dll", "mscorwks.dll"];

/// [`DumpInspector`] backed by the `minidump` crate.
pub struct MinidumpInspector;

impl DumpInspector for MinidumpInspector {
    fn inspect(&self, dump: &Path) -> Result<DumpInfo> {
        let read_error = |reason: String| Error::DumpRead {
            path: dump.to_path_buf(),
            reason,
        };

        let minidump = Minidump::read_path(dump).map_err(|e| read_error(e.to_string()))?;
        let system_info = minidump
            .get_stream::<MinidumpSystemInfo>()
            .map_err(|e| read_error(format!("no system info: {e}")))?;
        let modules = minidump
            .get_stream::<MinidumpModuleList>()
            .map_err(|e| read_error(format!("no module list: {e}")))?;

        let architecture = architecture_from_cpu(system_info.cpu);
        debug!(%architecture, modules = modules.iter().count(), "read dump");

        let mut runtimes = Vec::new();
        for module in modules.iter() {
            if !is_runtime_module(&module.name) {
                continue;
            }

            let info = &module.raw.version_info;
            if info.signature != VS_FFI_SIGNATURE {
                warn!(module = %module.name, "runtime module has no version information, skipping");
                continue;
            }

            let version = ClrVersion::from_file_version(info.file_version_hi, info.file_version_lo);
            runtimes.push(describe_runtime(
                &module.name,
                version,
                module.raw.time_date_stamp,
                module.raw.size_of_image,
                architecture,
            ));
        }

        Ok(DumpInfo {
            architecture,
            runtimes,
        })
    }
}

pub fn architecture_from_cpu(cpu: Cpu) -> Architecture {
    match cpu {
        Cpu::X86 => Architecture::X86,
        Cpu::X86_64 => Architecture::Amd64,
        Cpu::Arm => Architecture::Arm,
        Cpu::Arm64 => Architecture::Arm64,
        _ => Architecture::Unknown,
    }
}

/// File name part of a module path recorded in a dump (always Windows style).
pub fn module_file_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

pub fn is_runtime_module(path: &str) -> bool {
    let name = module_file_name(path);
    RUNTIME_MODULES
        .iter()
        .any(|runtime| name.eq_ignore_ascii_case(runtime))
}

/// Build the descriptor for a runtime module found in the dump.
pub fn describe_runtime(
    module_path: &str,
    version: ClrVersion,
    time_stamp: u32,
    file_size: u32,
    architecture: Architecture,
) -> ClrRuntime {
    let dac = DacInfo {
        file_name: DacInfo::request_file_name(version, architecture, architecture),
        time_stamp,
        file_size,
    };
    let local_matching_dac = local_matching_dac(Path::new(module_path), &dac, architecture);

    ClrRuntime {
        version,
        dac,
        module_path: module_path.to_string(),
        local_matching_dac,
    }
}

/// The DAC next to the runtime on this machine, if that runtime is the
/// exact build found in the dump.
pub fn local_matching_dac(
    module_path: &Path,
    dac: &DacInfo,
    architecture: Architecture,
) -> Option<PathBuf> {
    // Paths from another OS never resolve locally
    if !module_path.is_absolute() {
        return None;
    }

    let dac_path = module_path.parent()?.join(DAC_FILE_NAME);
    if !dac_path.is_file() {
        return None;
    }

    match read_image_identity(module_path) {
        Ok(local)
            if local.time_date_stamp == dac.time_stamp
                && local.size_of_image == dac.file_size
                && local.architecture() == architecture =>
        {
            Some(dac_path)
        }
        Ok(local) => {
            debug!(
                module = %module_path.display(),
                local_time_stamp = local.time_date_stamp,
                local_size = local.size_of_image,
                "local runtime is a different build"
            );
            None
        }
        Err(e) => {
            debug!(module = %module_path.display(), error = %e, "cannot read local runtime");
            None
        }
    }
}
