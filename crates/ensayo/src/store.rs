//! Durable artifact handoff between pipeline stages.
//!
//! Stages run as separate processes with nothing shared but the filesystem,
//! so every value a later stage needs (a created group's name, for example)
//! round-trips through a small JSON record on disk. The record survives
//! project boundaries, retries, and CI workers.
//!
//! The store is a port: stage code takes an [`ArtifactStore`] and never
//! touches the backing file directly. [`FileStore`] is the cross-process
//! adapter; [`MemoryStore`] backs unit tests.

use crate::result::{EnsayoError, EnsayoResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Conventional location of the runtime record, relative to the run's
/// working directory.
pub const DEFAULT_STORE_PATH: &str = "storage/runtime.json";

/// Well-known key for the group created by the create-group stage.
pub const GROUP_NAME_KEY: &str = "groupName";

/// Port for saving and retrieving named artifacts across stage boundaries.
///
/// Keys are stable identifiers agreed on by the producing and consuming
/// stages. Reading a key nothing wrote is a hard failure — a silently
/// missing artifact would let a downstream stage act on the wrong entity.
pub trait ArtifactStore: Send + Sync {
    /// Merge `value` into the record under `key`.
    ///
    /// After this returns, any later process reading the same backing
    /// storage observes the new value.
    fn save(&self, key: &str, value: &str) -> EnsayoResult<()>;

    /// Retrieve the value an earlier stage stored under `key`.
    ///
    /// # Errors
    ///
    /// [`EnsayoError::MissingArtifact`] if the record does not exist, the
    /// key is absent, or the record cannot be read as a JSON object — all
    /// three are the same fatal precondition failure for the caller.
    fn get(&self, key: &str) -> EnsayoResult<String>;

    /// Store the created group's name for downstream stages.
    fn save_group_name(&self, name: &str) -> EnsayoResult<()> {
        info!(group = name, "saving group name for downstream stages");
        self.save(GROUP_NAME_KEY, name)
    }

    /// Retrieve the group name a previous stage created.
    fn get_group_name(&self) -> EnsayoResult<String> {
        self.get(GROUP_NAME_KEY)
    }
}

// =============================================================================
// FILE-BACKED STORE
// =============================================================================

/// JSON-file-backed store shared across OS processes.
///
/// Every access round-trips through the file — there is no in-memory cache,
/// which is what makes values written by one stage visible to the next
/// independently-launched one. Writes replace the file atomically
/// (temp file + rename + sync) so a half-written record can never be
/// observed, even if the sequential-stage assumption is ever violated.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

impl FileStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record, preserving keys this process knows nothing
    /// about.
    fn read_record(&self, key: &str) -> EnsayoResult<Map<String, Value>> {
        if !self.path.exists() {
            return Err(EnsayoError::MissingArtifact {
                key: key.to_string(),
                reason: format!("store file {} does not exist", self.path.display()),
            });
        }

        let raw = fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| EnsayoError::MissingArtifact {
            key: key.to_string(),
            reason: format!("store file {} is not well-formed: {e}", self.path.display()),
        })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(EnsayoError::MissingArtifact {
                key: key.to_string(),
                reason: format!("store root must be an object, found {other}"),
            }),
        }
    }

    /// Replace the backing file atomically and flush it to disk.
    fn write_record(&self, record: &Map<String, Value>) -> EnsayoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(record)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ArtifactStore for FileStore {
    fn save(&self, key: &str, value: &str) -> EnsayoResult<()> {
        assert!(!key.is_empty(), "artifact key must not be empty");

        // Read-modify-write of the whole record: unknown keys written by
        // other producers must survive this save.
        let mut record = if self.path.exists() {
            self.read_record(key)?
        } else {
            Map::new()
        };

        record.insert(key.to_string(), Value::String(value.to_string()));
        self.write_record(&record)?;

        debug!(key, path = %self.path.display(), "artifact saved");
        Ok(())
    }

    fn get(&self, key: &str) -> EnsayoResult<String> {
        assert!(!key.is_empty(), "artifact key must not be empty");

        let record = self.read_record(key)?;
        match record.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(EnsayoError::MissingArtifact {
                key: key.to_string(),
                reason: format!("stored value is not a string: {other}"),
            }),
            None => Err(EnsayoError::MissingArtifact {
                key: key.to_string(),
                reason: "key not present in store".to_string(),
            }),
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory adapter for tests that exercise stage logic without a
/// filesystem. Same fail-fast contract as [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryStore {
    fn save(&self, key: &str, value: &str) -> EnsayoResult<()> {
        assert!(!key.is_empty(), "artifact key must not be empty");
        let mut record = self.record.lock().expect("store mutex poisoned");
        record.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> EnsayoResult<String> {
        assert!(!key.is_empty(), "artifact key must not be empty");
        let record = self.record.lock().expect("store mutex poisoned");
        record
            .get(key)
            .cloned()
            .ok_or_else(|| EnsayoError::MissingArtifact {
                key: key.to_string(),
                reason: "key not present in store".to_string(),
            })
    }
}
