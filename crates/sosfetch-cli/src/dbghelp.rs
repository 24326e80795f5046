//! Symbol lookup through dbghelp.dll and symsrv.dll.
//!
//! `SymInitializeW` is called when the session is opened and `SymCleanup`
//! when it is dropped.

use std::ffi::c_void;
use std::path::PathBuf;

use sosfetch_shared::{Error, FileIdentity, LookupError, Result, SymbolService, SymbolSession};
use tracing::debug;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Diagnostics::Debug::{
    SSRVOPT_DWORD, SymCleanup, SymFindFileInPathW, SymInitializeW,
};
use windows::Win32::System::Threading::GetCurrentProcess;
use windows::core::{PCWSTR, PWSTR};

const MAX_FOUND_PATH: usize = 2048;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct DbgHelp {
    /// Explicit search path; dbghelp falls back to `_NT_SYMBOL_PATH` when unset.
    search_path: Option<String>,
}

impl DbgHelp {
    pub fn new(search_path: Option<String>) -> Self {
        Self { search_path }
    }
}

impl SymbolService for DbgHelp {
    type Session = DbgHelpSession;

    fn initialize(&self) -> Result<DbgHelpSession> {
        let process = unsafe { GetCurrentProcess() };
        let search_path = self.search_path.as_deref().map(to_wide);
        let search_path = search_path
            .as_ref()
            .map_or(PCWSTR::null(), |p| PCWSTR::from_raw(p.as_ptr()));

        unsafe { SymInitializeW(process, search_path, false) }
            .map_err(|e| Error::SymbolInit(format!("dbghelp.dll: {e}")))?;

        debug!(search_path = ?self.search_path, "dbghelp initialized");
        Ok(DbgHelpSession { process })
    }
}

pub struct DbgHelpSession {
    process: HANDLE,
}

impl SymbolSession for DbgHelpSession {
    fn find_file(&mut self, identity: &FileIdentity) -> std::result::Result<PathBuf, LookupError> {
        let file_name = to_wide(&identity.file_name);
        let mut found = vec![0u16; MAX_FOUND_PATH];

        // With SSRVOPT_DWORD the id is the time stamp itself, not a pointer to it
        unsafe {
            SymFindFileInPathW(
                self.process,
                PCWSTR::null(),
                PCWSTR::from_raw(file_name.as_ptr()),
                Some(identity.time_stamp as usize as *const c_void),
                identity.file_size,
                0,
                SSRVOPT_DWORD,
                PWSTR::from_raw(found.as_mut_ptr()),
                None,
                None,
            )
        }
        .map_err(|e| LookupError::new(i64::from(e.code().0), e.message()))?;

        let len = found.iter().position(|&c| c == 0).unwrap_or(found.len());
        Ok(PathBuf::from(String::from_utf16_lossy(&found[..len])))
    }
}

impl Drop for DbgHelpSession {
    fn drop(&mut self) {
        unsafe {
            let _ = SymCleanup(self.process);
        }
        debug!("dbghelp cleaned up");
    }
}
