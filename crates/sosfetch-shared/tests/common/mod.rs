//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sosfetch_shared::{
    Architecture, ClrRuntime, ClrVersion, DacInfo, Debugger, DebuggerCommand, DumpInfo,
    DumpInspector, Error, FileIdentity, LookupError, Result, SymbolService, SymbolSession,
    debugger_arguments,
};

/// How many lookups of a file fail before it is found.
#[derive(Debug, Clone, Copy)]
pub enum Failures {
    Times(u32),
    Always,
}

#[derive(Default)]
pub struct StoreState {
    pub initialized: Cell<u32>,
    pub released: Cell<u32>,
    pub lookups: RefCell<Vec<String>>,
}

impl StoreState {
    pub fn lookups_of(&self, name: &str) -> usize {
        self.lookups.borrow().iter().filter(|n| *n == name).count()
    }
}

/// Symbol service serving files out of a scratch directory.
pub struct FakeStore {
    root: PathBuf,
    failures: HashMap<String, Failures>,
    init_error: Option<String>,
    pub state: Rc<StoreState>,
}

impl FakeStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            failures: HashMap::new(),
            init_error: None,
            state: Rc::new(StoreState::default()),
        }
    }

    pub fn failing(mut self, file_name: &str, failures: Failures) -> Self {
        self.failures.insert(file_name.to_string(), failures);
        self
    }

    pub fn broken(mut self, reason: &str) -> Self {
        self.init_error = Some(reason.to_string());
        self
    }
}

impl SymbolService for FakeStore {
    type Session = FakeSession;

    fn initialize(&self) -> Result<FakeSession> {
        if let Some(reason) = &self.init_error {
            return Err(Error::SymbolInit(reason.clone()));
        }
        self.state.initialized.set(self.state.initialized.get() + 1);
        Ok(FakeSession {
            root: self.root.clone(),
            failures: self.failures.clone(),
            state: Rc::clone(&self.state),
        })
    }
}

pub struct FakeSession {
    root: PathBuf,
    failures: HashMap<String, Failures>,
    state: Rc<StoreState>,
}

impl SymbolSession for FakeSession {
    fn find_file(&mut self, identity: &FileIdentity) -> std::result::Result<PathBuf, LookupError> {
        self.state
            .lookups
            .borrow_mut()
            .push(identity.file_name.clone());

        match self.failures.get_mut(&identity.file_name) {
            Some(Failures::Always) => return Err(LookupError::new(2, "file not found")),
            Some(Failures::Times(n)) if *n > 0 => {
                *n -= 1;
                return Err(LookupError::new(1460, "timeout"));
            }
            _ => {}
        }

        let path = self.root.join(&identity.file_name);
        std::fs::write(&path, served_contents(identity))
            .map_err(|e| LookupError::new(0, e.to_string()))?;
        Ok(path)
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.released.set(self.state.released.get() + 1);
    }
}

/// What [`FakeSession`] writes for `identity`.
pub fn served_contents(identity: &FileIdentity) -> String {
    format!("{}:{}", identity.file_name, identity.index_key())
}

pub fn served(file_name: &str, runtime: &ClrRuntime) -> String {
    served_contents(&FileIdentity {
        file_name: file_name.to_string(),
        time_stamp: runtime.dac.time_stamp,
        file_size: runtime.dac.file_size,
    })
}

/// The 4.6.1.0 amd64 runtime used throughout the tests.
pub fn clr_4_6_1() -> ClrRuntime {
    let version = ClrVersion::new(4, 6, 1, 0);
    ClrRuntime {
        version,
        dac: DacInfo {
            file_name: "mscordacwks_amd64_amd64_4.6.1.00.dll".into(),
            time_stamp: 0x5A10_0000,
            file_size: 1_048_576,
        },
        module_path: r"C:\Windows\Microsoft.NET\Framework64\v4.0.30319\clr.dll".into(),
        local_matching_dac: None,
    }
}

pub struct FakeInspector {
    pub info: Option<DumpInfo>,
}

impl FakeInspector {
    pub fn with(architecture: Architecture, runtimes: Vec<ClrRuntime>) -> Self {
        Self {
            info: Some(DumpInfo {
                architecture,
                runtimes,
            }),
        }
    }

    pub fn unreadable() -> Self {
        Self { info: None }
    }
}

impl DumpInspector for FakeInspector {
    fn inspect(&self, dump: &Path) -> Result<DumpInfo> {
        self.info.clone().ok_or_else(|| Error::DumpRead {
            path: dump.to_path_buf(),
            reason: "not a minidump".into(),
        })
    }
}

#[derive(Default)]
pub struct RecordingDebugger {
    pub launches: RefCell<Vec<Vec<String>>>,
    pub missing: bool,
}

impl Debugger for RecordingDebugger {
    fn launch(&self, dump: &Path, command: &DebuggerCommand) -> Result<()> {
        if self.missing {
            return Err(Error::DebuggerLaunch {
                path: PathBuf::from("windbg.exe"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        self.launches
            .borrow_mut()
            .push(debugger_arguments(dump, command));
        Ok(())
    }
}
