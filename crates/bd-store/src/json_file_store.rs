//! Single-file JSON store.
//!
//! The whole store is one JSON object shared with other writers (the UI, the
//! CLI, other handles). Nothing is cached: every read goes to disk, and every
//! mutation re-reads the file, changes one key and writes it back via
//! write-to-temp-then-rename, so keys written by others survive and an
//! interrupted write never leaves a truncated file behind.

use crate::{DEFAULT_STORE_FILENAME, KeyValueStore, StoreError, StoreResult};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::debug;

/// Serializes read-modify-write cycles of every handle in this process.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the default store file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(data_dir.join(DEFAULT_STORE_FILENAME))
    }

    /// Open a store file, starting empty when it does not exist yet.
    ///
    /// An empty file is treated as an empty store. Anything that is not a
    /// JSON object is rejected as corrupted rather than silently replaced.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { path: path.into() };

        let entries = store.load()?;
        debug!("Opened store {} ({} keys)", store.path.display(), entries.len());

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_lock() -> MutexGuard<'static, ()> {
        WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> StoreResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::corrupted(
                &self.path,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
            Err(e) => Err(StoreError::corrupted(&self.path, e.to_string())),
        }
    }

    fn persist(&self, entries: &Map<String, Value>) -> StoreResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let content = serde_json::to_string_pretty(entries)?;

        // Per-process temp name so two processes never rename each other's file
        let temp_path = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        std::fs::write(&temp_path, content).map_err(|e| StoreError::io(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let _guard = Self::write_lock();
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value);
        self.persist(&entries)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = Self::write_lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
