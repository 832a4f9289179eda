//! Session record persistence.
//!
//! Stores exactly one record in `<base>/session.json` with restricted
//! permissions (0600). Tokens are never logged.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use super::record::SessionRecord;
use crate::config::paths;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("refusing to store a session record without a token")]
    MissingToken,

    #[error("failed to serialize session record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write session record at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read access to the current session, re-evaluated on every call.
pub trait SessionProvider: Send + Sync {
    fn current_session(&self) -> Option<SessionRecord>;
}

/// Durable storage for a single session record.
///
/// `save` fully replaces any previous record. `load` never fails: missing or
/// corrupt data reads as "no session".
pub trait CredentialStore: Send + Sync {
    /// # Errors
    /// Fails if the record has no token or cannot be written.
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    fn load(&self) -> Option<SessionRecord>;

    /// Removes the record. Returns whether one was present.
    ///
    /// # Errors
    /// Fails if an existing record cannot be removed.
    fn clear(&self) -> Result<bool, StoreError>;
}

impl<T: CredentialStore + ?Sized> SessionProvider for T {
    fn current_session(&self) -> Option<SessionRecord> {
        self.load()
    }
}

/// Parses a stored value, treating anything unusable as absent.
fn decode_record(contents: &str, source: &str) -> Option<SessionRecord> {
    match serde_json::from_str::<SessionRecord>(contents) {
        Ok(record) if record.has_token() => Some(record),
        Ok(_) => {
            warn!(source, "stored session record has no token; ignoring it");
            None
        }
        Err(err) => {
            warn!(source, error = %err, "stored session record is corrupt; ignoring it");
            None
        }
    }
}

/// File-backed store under the Campus home directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$CAMPUS_HOME/session.json`.
    pub fn in_campus_home() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if !record.has_token() {
            return Err(StoreError::MissingToken);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let contents = serde_json::to_string_pretty(record)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))?;
        // The write is confirmed on disk before callers navigate away.
        file.sync_all().map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "session record saved");
        Ok(())
    }

    fn load(&self) -> Option<SessionRecord> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => decode_record(&contents, &self.path.display().to_string()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read session record");
                None
            }
        }
    }

    fn clear(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session record cleared");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// In-process store; holds the serialized record like the file store does.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    raw: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an arbitrary stored value, parseable or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if !record.has_token() {
            return Err(StoreError::MissingToken);
        }
        let contents = serde_json::to_string(record)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents);
        Ok(())
    }

    fn load(&self) -> Option<SessionRecord> {
        let raw = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        raw.as_deref().and_then(|contents| decode_record(contents, "memory"))
    }

    fn clear(&self) -> Result<bool, StoreError> {
        Ok(self
            .raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}
