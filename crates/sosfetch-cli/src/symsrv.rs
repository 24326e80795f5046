//! HTTP symbol store client.
//!
//! Fetches `<server>/<file>/<key>/<file>` where the key is the image time
//! stamp and size. Downloads land in a staging directory owned by the
//! session and removed when it is dropped.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use sosfetch_shared::{Error, FileIdentity, LookupError, Result, SymbolService, SymbolSession};
use tempfile::TempDir;
use tracing::debug;
use ureq::Agent;

pub const DEFAULT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Symbol store reachable over HTTP.
#[derive(Debug, Clone)]
pub struct SymbolServer {
    base_url: String,
}

impl SymbolServer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// URL of the file matching `identity`.
    pub fn file_url(&self, identity: &FileIdentity) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            identity.file_name,
            identity.index_key(),
            identity.file_name
        )
    }
}

impl SymbolService for SymbolServer {
    type Session = SymbolServerSession;

    fn initialize(&self) -> Result<SymbolServerSession> {
        let staging = tempfile::Builder::new()
            .prefix("sosfetch-")
            .tempdir()
            .map_err(|e| Error::SymbolInit(format!("Failed to create staging directory: {e}")))?;

        let config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();

        debug!(server = %self.base_url, staging = %staging.path().display(), "symbol server session opened");

        Ok(SymbolServerSession {
            server: self.clone(),
            agent: Agent::new_with_config(config),
            staging,
        })
    }
}

pub struct SymbolServerSession {
    server: SymbolServer,
    agent: Agent,
    staging: TempDir,
}

fn lookup_error(error: ureq::Error) -> LookupError {
    match error {
        ureq::Error::StatusCode(status) => {
            LookupError::new(i64::from(status), format!("symbol server returned status {status}"))
        }
        other => LookupError::new(0, other.to_string()),
    }
}

impl SymbolSession for SymbolServerSession {
    fn find_file(&mut self, identity: &FileIdentity) -> std::result::Result<PathBuf, LookupError> {
        let url = self.server.file_url(identity);
        debug!(%url, "requesting");

        let response = self.agent.get(&url).call().map_err(lookup_error)?;

        let path = self.staging.path().join(&identity.file_name);
        let mut file = File::create(&path).map_err(|e| {
            LookupError::new(0, format!("Failed to create {}: {e}", path.display()))
        })?;
        let mut body = response.into_body().into_reader();
        let size = std::io::copy(&mut body, &mut file)
            .map_err(|e| LookupError::new(0, format!("Failed to read response: {e}")))?;

        debug!(file = %identity.file_name, bytes = size, "downloaded");
        Ok(path)
    }
}
