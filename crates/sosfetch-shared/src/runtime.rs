//! Runtime descriptors reported by the dump inspector.

use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Version
// =============================================================================

/// Version of a desktop CLR build as stored in its file version resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClrVersion {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
    pub patch: u16,
}

impl ClrVersion {
    pub const fn new(major: u16, minor: u16, revision: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            revision,
            patch,
        }
    }

    /// Build a version from the `VS_FIXEDFILEINFO` file version words.
    pub const fn from_file_version(hi: u32, lo: u32) -> Self {
        Self::new(
            (hi >> 16) as u16,
            (hi & 0xFFFF) as u16,
            (lo >> 16) as u16,
            (lo & 0xFFFF) as u16,
        )
    }

    /// Dotted form used inside symbol server file names, e.g. `4.6.1055.00`.
    pub fn file_suffix(&self) -> String {
        format!(
            "{}.{}.{}.{:02}",
            self.major, self.minor, self.revision, self.patch
        )
    }
}

impl fmt::Display for ClrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.file_suffix())
    }
}

// =============================================================================
// Architecture
// =============================================================================

/// Processor architecture of the dumped process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    Amd64,
    Arm,
    Arm64,
    Unknown,
}

impl Architecture {
    /// Lower-case token used in symbol server file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::Amd64 => "amd64",
            Architecture::Arm => "arm",
            Architecture::Arm64 => "arm64",
            Architecture::Unknown => "unknown",
        }
    }

    /// Pointer width required to debug this architecture, for the ones we
    /// can fetch support files for.
    pub fn required_bitness(&self) -> Option<Bitness> {
        match self {
            Architecture::X86 => Some(Bitness::Bits32),
            Architecture::Amd64 => Some(Bitness::Bits64),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer width of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    /// Bitness of this build of the tool.
    pub fn current() -> Self {
        Self::from_pointer_size(std::mem::size_of::<usize>())
    }

    /// Anything other than 4 is treated as 64-bit.
    pub fn from_pointer_size(size: usize) -> Self {
        if size == 4 {
            Bitness::Bits32
        } else {
            Bitness::Bits64
        }
    }

    pub fn pointer_size(&self) -> usize {
        match self {
            Bitness::Bits32 => 4,
            Bitness::Bits64 => 8,
        }
    }

    /// Host token embedded in SOS file names.
    pub fn token(&self) -> &'static str {
        match self {
            Bitness::Bits32 => "x86",
            Bitness::Bits64 => "amd64",
        }
    }
}

// =============================================================================
// Runtime Info
// =============================================================================

/// Symbol server identity of the runtime's DAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DacInfo {
    pub file_name: String,
    pub time_stamp: u32,
    pub file_size: u32,
}

impl DacInfo {
    /// Request file name the symbol server indexes the DAC under.
    pub fn request_file_name(
        version: ClrVersion,
        host: Architecture,
        target: Architecture,
    ) -> String {
        format!(
            "mscordacwks_{}_{}_{}.dll",
            host,
            target,
            version.file_suffix()
        )
    }
}

/// One CLR found in a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClrRuntime {
    pub version: ClrVersion,
    pub dac: DacInfo,
    /// Path of the runtime module as recorded in the dump.
    pub module_path: String,
    /// DAC on this machine that matches the dumped runtime, if any.
    pub local_matching_dac: Option<PathBuf>,
}

/// What the inspector learned about a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpInfo {
    pub architecture: Architecture,
    pub runtimes: Vec<ClrRuntime>,
}
