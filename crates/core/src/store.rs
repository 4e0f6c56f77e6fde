//! Store access layer.
//!
//! The persisted state is a single JSON object mapping patient id to stored
//! record fields. Access is whole-collection only: `load` reads and parses
//! the entire mapping, `save` rewrites it. There is no locking, no partial
//! write and no recovery: a crash mid-save can leave the file truncated.
//!
//! The [`PatientStore`] trait is the seam for substituting the backing
//! resource: production uses [`JsonFileStore`], tests use [`InMemoryStore`].

use crate::error::{RegistryError, RegistryResult};
use crate::patient::StoredRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The full persisted collection, keyed by patient id.
///
/// A `BTreeMap` makes key uniqueness structural and gives the collection a
/// deterministic listing order, which stable sorts use to break ties.
pub type Store = BTreeMap<String, StoredRecord>;

/// Whole-collection load/save over the backing resource.
pub trait PatientStore: Send + Sync {
    /// Reads and parses the full persisted mapping.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::StoreRead` if the backing resource is missing
    /// or unreadable, or `RegistryError::StoreParse` if it is unparsable.
    fn load(&self) -> RegistryResult<Store>;

    /// Overwrites the full persisted mapping.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::StoreEncode` or `RegistryError::StoreWrite`
    /// on failure.
    fn save(&self, store: &Store) -> RegistryResult<()>;
}

/// File-backed store: one JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty store file if none exists.
    ///
    /// Returns `true` if the file was created, `false` if one was already
    /// present (the existing file is left untouched).
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::StoreWrite` if the file cannot be written.
    pub fn initialise(&self) -> RegistryResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        self.save(&Store::new())?;
        Ok(true)
    }
}

impl PatientStore for JsonFileStore {
    fn load(&self) -> RegistryResult<Store> {
        let contents = fs::read_to_string(&self.path).map_err(RegistryError::StoreRead)?;
        serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("failed to parse patient store {}: {}", self.path.display(), e);
            RegistryError::StoreParse(e)
        })
    }

    fn save(&self, store: &Store) -> RegistryResult<()> {
        let contents = serde_json::to_string(store).map_err(RegistryError::StoreEncode)?;
        fs::write(&self.path, contents).map_err(RegistryError::StoreWrite)
    }
}

/// Mutex-guarded in-memory store.
///
/// Primarily a test double for the file store; also usable when embedding
/// the registry without any persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Store>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Store) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl PatientStore for InMemoryStore {
    fn load(&self) -> RegistryResult<Store> {
        Ok(self.records.lock().expect("store mutex poisoned").clone())
    }

    fn save(&self, store: &Store) -> RegistryResult<()> {
        *self.records.lock().expect("store mutex poisoned") = store.clone();
        Ok(())
    }
}
