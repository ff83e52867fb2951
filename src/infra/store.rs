//! JSON file backed workspace store.

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::workspace::{KeyValueStore, StoreError};

use super::error::InfraError;

const STORE_FILE: &str = "workspace.json";

/// Keeps every key in one JSON object, rewritten atomically on change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store inside `directory`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, InfraError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        Ok(Self {
            path: directory.join(STORE_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StoreError::from_persistence(err)),
        };
        serde_json::from_str(&raw).map_err(|err| {
            StoreError::corrupt(format!("{} is not valid JSON: {err}", self.path.display()))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let directory = self
            .path
            .parent()
            .ok_or_else(|| StoreError::from_persistence("store path has no parent directory"))?;
        let body = serde_json::to_vec_pretty(entries).map_err(StoreError::from_persistence)?;

        let mut file = NamedTempFile::new_in(directory).map_err(StoreError::from_persistence)?;
        file.write_all(&body).map_err(StoreError::from_persistence)?;
        file.persist(&self.path)
            .map_err(|err| StoreError::from_persistence(err.error))?;
        debug!(
            target = "markprint::workspace",
            path = %self.path.display(),
            keys = entries.len(),
            "workspace store written"
        );
        Ok(())
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
