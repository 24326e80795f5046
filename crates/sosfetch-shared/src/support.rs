//! Names of the debug support files for a runtime build.
//!
//! Every name here is a pure function of its inputs. The locator uses the
//! lookup name to query the symbol server and stores the result under the
//! destination name.

use crate::runtime::{Architecture, Bitness, ClrRuntime, ClrVersion};
use crate::symbols::FileIdentity;

/// Destination name of the SOS extension in the cache directory.
pub const SOS_FILE_NAME: &str = "SOS.dll";

/// Destination name of the DAC in the cache directory.
pub const DAC_FILE_NAME: &str = "mscordacwks.dll";

/// File name of the CLR core library (`mscorwks.dll` for v2, `clr.dll` otherwise).
pub fn core_library_name(major: u16) -> &'static str {
    if major == 2 {
        "mscorwks.dll"
    } else {
        "clr.dll"
    }
}

/// Symbol server name of the SOS build matching `version`.
pub fn sos_file_name(bitness: Bitness, target: Architecture, version: ClrVersion) -> String {
    format!(
        "sos_{}_{}_{}.dll",
        bitness.token(),
        target.as_str(),
        version.file_suffix()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportFileKind {
    CoreLibrary,
    Sos,
    Dac,
}

impl SupportFileKind {
    pub fn description(&self) -> &'static str {
        match self {
            SupportFileKind::CoreLibrary => "runtime core library",
            SupportFileKind::Sos => "SOS extension",
            SupportFileKind::Dac => "data access component",
        }
    }
}

/// A single file to look up and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFile {
    pub kind: SupportFileKind,
    pub identity: FileIdentity,
    pub destination: String,
}

/// The three files a debugger needs to inspect a dump of one runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFileSet {
    pub files: [SupportFile; 3],
}

impl SupportFileSet {
    /// Derive the file set for `runtime` on a `target` dump, read by a
    /// process of the given `bitness`.
    ///
    /// All three lookups reuse the DAC's time stamp and size.
    pub fn derive(runtime: &ClrRuntime, target: Architecture, bitness: Bitness) -> Self {
        let identity = |file_name: String| FileIdentity {
            file_name,
            time_stamp: runtime.dac.time_stamp,
            file_size: runtime.dac.file_size,
        };

        let core = core_library_name(runtime.version.major);

        Self {
            files: [
                SupportFile {
                    kind: SupportFileKind::CoreLibrary,
                    identity: identity(core.to_string()),
                    destination: core.to_string(),
                },
                SupportFile {
                    kind: SupportFileKind::Sos,
                    identity: identity(sos_file_name(bitness, target, runtime.version)),
                    destination: SOS_FILE_NAME.to_string(),
                },
                SupportFile {
                    kind: SupportFileKind::Dac,
                    identity: identity(runtime.dac.file_name.clone()),
                    destination: DAC_FILE_NAME.to_string(),
                },
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportFile> {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::DacInfo;

    fn runtime(version: ClrVersion) -> ClrRuntime {
        ClrRuntime {
            version,
            dac: DacInfo {
                file_name: DacInfo::request_file_name(
                    version,
                    Architecture::Amd64,
                    Architecture::Amd64,
                ),
                time_stamp: 0x5A10_0000,
                file_size: 1_048_576,
            },
            module_path: r"C:\Windows\Microsoft.NET\Framework64\v4.0.30319\clr.dll".into(),
            local_matching_dac: None,
        }
    }

    #[test]
    fn test_core_library_name() {
        for major in 0..=10u16 {
            let expected = if major == 2 { "mscorwks.dll" } else { "clr.dll" };
            assert_eq!(core_library_name(major), expected, "major {}", major);
        }
    }

    #[test]
    fn test_sos_file_name() {
        let version = ClrVersion::new(4, 7, 3190, 0);
        assert_eq!(
            sos_file_name(Bitness::Bits32, Architecture::X86, version),
            "sos_x86_x86_4.7.3190.00.dll"
        );
        assert_eq!(
            sos_file_name(Bitness::Bits64, Architecture::Amd64, version),
            "sos_amd64_amd64_4.7.3190.00.dll"
        );
        assert_eq!(
            sos_file_name(Bitness::Bits64, Architecture::Amd64, ClrVersion::new(2, 0, 50727, 5)),
            "sos_amd64_amd64_2.0.50727.05.dll"
        );
        assert_eq!(
            sos_file_name(Bitness::Bits64, Architecture::Amd64, ClrVersion::new(4, 8, 9032, 123)),
            "sos_amd64_amd64_4.8.9032.123.dll"
        );
    }

    #[test]
    fn test_derive_file_set() {
        let set = SupportFileSet::derive(
            &runtime(ClrVersion::new(4, 6, 1, 0)),
            Architecture::Amd64,
            Bitness::Bits64,
        );

        let lookups: Vec<_> = set.iter().map(|f| f.identity.file_name.as_str()).collect();
        assert_eq!(
            lookups,
            [
                "clr.dll",
                "sos_amd64_amd64_4.6.1.00.dll",
                "mscordacwks_amd64_amd64_4.6.1.00.dll"
            ]
        );

        let destinations: Vec<_> = set.iter().map(|f| f.destination.as_str()).collect();
        assert_eq!(destinations, ["clr.dll", "SOS.dll", "mscordacwks.dll"]);

        for file in set.iter() {
            assert_eq!(file.identity.time_stamp, 0x5A10_0000);
            assert_eq!(file.identity.file_size, 1_048_576);
        }
    }

    #[test]
    fn test_derive_file_set_v2() {
        let set = SupportFileSet::derive(
            &runtime(ClrVersion::new(2, 0, 50727, 8762)),
            Architecture::Amd64,
            Bitness::Bits64,
        );
        assert_eq!(set.files[0].identity.file_name, "mscorwks.dll");
        assert_eq!(set.files[0].destination, "mscorwks.dll");
    }
}
