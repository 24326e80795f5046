//! Support file locator.
//!
//! Looks up the SOS, DAC and core library files for one runtime build and
//! copies them into a cache directory keyed by the runtime version.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::runtime::{Architecture, Bitness, ClrRuntime, ClrVersion};
use crate::support::{SupportFile, SupportFileSet};
use crate::symbols::{LookupError, SymbolService, SymbolSession};
use crate::{Error, Result};

// =============================================================================
// Policies
// =============================================================================

/// Fixed-delay retry for symbol lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// Whether a resolution with missing files counts as a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Completeness {
    /// Report whatever was fetched; missing files are only logged.
    #[default]
    BestEffort,
    /// Fail with [`Error::Incomplete`] if any file could not be fetched.
    RequireAll,
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Copied to this path inside the cache directory.
    Resolved(PathBuf),
    /// Every attempt failed.
    Exhausted {
        attempts: u32,
        last_error: LookupError,
    },
    /// Found, but could not be copied into the cache directory.
    CopyFailed { source: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub file: SupportFile,
    pub outcome: FileOutcome,
}

/// Result of a locator run.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub directory: PathBuf,
    pub files: Vec<ResolvedFile>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.files
            .iter()
            .all(|f| matches!(f.outcome, FileOutcome::Resolved(_)))
    }

    /// Files that could not be fetched.
    pub fn missing(&self) -> impl Iterator<Item = &SupportFile> {
        self.files
            .iter()
            .filter(|f| !matches!(f.outcome, FileOutcome::Resolved(_)))
            .map(|f| &f.file)
    }
}

/// `<temp>/<version>`, the cache directory used when none is configured.
pub fn default_storage_location(version: ClrVersion) -> PathBuf {
    std::env::temp_dir().join(version.to_string())
}

// =============================================================================
// Locator
// =============================================================================

pub struct Locator<S> {
    service: S,
    retry: RetryPolicy,
    completeness: Completeness,
    bitness: Bitness,
}

impl<S: SymbolService> Locator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            retry: RetryPolicy::default(),
            completeness: Completeness::default(),
            bitness: Bitness::current(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = completeness;
        self
    }

    /// Override the host bitness used in the SOS file name.
    pub fn with_bitness(mut self, bitness: Bitness) -> Self {
        self.bitness = bitness;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetch the support files for `runtime` into `storage_location`, or
    /// into [`default_storage_location`] when none is given.
    pub fn resolve(
        &self,
        runtime: &ClrRuntime,
        target: Architecture,
        storage_location: Option<&Path>,
    ) -> Result<Resolution> {
        let mut session = self.service.initialize()?;

        let directory = storage_location
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_storage_location(runtime.version));
        std::fs::create_dir_all(&directory).map_err(|source| Error::CacheDirectory {
            path: directory.clone(),
            source,
        })?;

        info!(version = %runtime.version, directory = %directory.display(), "resolving support files");

        let set = SupportFileSet::derive(runtime, target, self.bitness);
        let mut files = Vec::with_capacity(set.files.len());

        for file in set.iter() {
            let outcome = match self.fetch(&mut session, file) {
                Ok(source) => {
                    let destination = directory.join(&file.destination);
                    match std::fs::copy(&source, &destination) {
                        Ok(_) => {
                            info!(file = %file.destination, path = %destination.display(), "copied");
                            FileOutcome::Resolved(destination)
                        }
                        Err(e) => {
                            warn!(
                                file = %file.destination,
                                from = %source.display(),
                                "failed to copy into {}: {}",
                                destination.display(),
                                e
                            );
                            FileOutcome::CopyFailed {
                                source,
                                reason: e.to_string(),
                            }
                        }
                    }
                }
                Err(last_error) => {
                    warn!(
                        file = %file.destination,
                        attempts = self.attempts(),
                        "giving up on {}: {}",
                        file.kind.description(),
                        last_error
                    );
                    FileOutcome::Exhausted {
                        attempts: self.attempts(),
                        last_error,
                    }
                }
            };
            files.push(ResolvedFile {
                file: file.clone(),
                outcome,
            });
        }

        drop(session);

        let resolution = Resolution { directory, files };
        if self.completeness == Completeness::RequireAll && !resolution.is_complete() {
            return Err(Error::Incomplete {
                directory: resolution.directory.clone(),
                missing: resolution.missing().map(|f| f.destination.clone()).collect(),
            });
        }

        Ok(resolution)
    }

    fn attempts(&self) -> u32 {
        self.retry.max_attempts.max(1)
    }

    /// Look up one file, retrying with a fixed delay.
    fn fetch(
        &self,
        session: &mut S::Session,
        file: &SupportFile,
    ) -> std::result::Result<PathBuf, LookupError> {
        let attempts = self.attempts();
        let mut last_error = LookupError::new(0, "no lookup attempted");
        for attempt in 1..=attempts {
            match session.find_file(&file.identity) {
                Ok(path) => {
                    debug!(file = %file.identity, attempt, source = %path.display(), "found");
                    return Ok(path);
                }
                Err(e) => {
                    warn!(
                        file = %file.destination,
                        attempt,
                        code = e.code,
                        "error retrieving {} from symbol server: {}",
                        file.identity.file_name,
                        e.message
                    );
                    last_error = e;
                    if attempt < attempts {
                        thread::sleep(self.retry.delay);
                    }
                }
            }
        }
        Err(last_error)
    }
}
