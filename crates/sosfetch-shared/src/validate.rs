//! Preconditions checked before any symbol lookup.

use std::fmt;

use crate::runtime::{Architecture, Bitness, ClrRuntime, DumpInfo};

/// Why a dump cannot be handled by this build of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoRuntime,
    MultipleRuntimes(usize),
    BitnessMismatch {
        dump: Architecture,
        required: Bitness,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoRuntime => f.write_str("This dump file does not have a CLR loaded in it."),
            Rejection::MultipleRuntimes(count) => write!(
                f,
                "This dump file has multiple CLR versions loaded in it ({count})."
            ),
            Rejection::BitnessMismatch { required, .. } => {
                let bits = match required {
                    Bitness::Bits32 => 32,
                    Bitness::Bits64 => 64,
                };
                write!(
                    f,
                    "Please use the {bits} bit version of sosfetch to analyze this dump."
                )
            }
        }
    }
}

/// Return the single runtime in `dump` if a process of `host` bitness can
/// fetch support files for it.
pub fn validate(dump: &DumpInfo, host: Bitness) -> Result<&ClrRuntime, Rejection> {
    let runtime = match dump.runtimes.as_slice() {
        [] => return Err(Rejection::NoRuntime),
        [runtime] => runtime,
        many => return Err(Rejection::MultipleRuntimes(many.len())),
    };

    if let Some(required) = dump.architecture.required_bitness()
        && required != host
    {
        return Err(Rejection::BitnessMismatch {
            dump: dump.architecture,
            required,
        });
    }

    Ok(runtime)
}
