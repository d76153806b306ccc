//! Request/response commands exposed to the UI layer.
//!
//! Errors are flattened to strings with a recovery hint appended, which is
//! the shape the UI displays directly.

use crate::paths::AppPaths;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bd_store::{KeyValueStore, StoreError, keys, read_temp_port_file};
use serde_json::Value;
use tracing::error;

const SUPERVISOR_OWNED_KEYS: [&str; 1] = [keys::API_ENDPOINT];

pub struct Bridge {
    store: Arc<dyn KeyValueStore>,
    paths: AppPaths,
}

impl Bridge {
    pub fn new(store: Arc<dyn KeyValueStore>, paths: AppPaths) -> Self {
        Self { store, paths }
    }

    /// Base URL of the running backend.
    pub fn get_api_endpoint(&self) -> Result<String, String> {
        match self.store.get(keys::API_ENDPOINT) {
            Ok(Some(Value::String(endpoint))) if !endpoint.is_empty() => Ok(endpoint),
            Ok(_) => {
                error!("Failed to fetch API endpoint: not set");
                Err(format!(
                    "API endpoint not set\n\nHint: {}",
                    StoreError::not_found(keys::API_ENDPOINT).recovery_hint()
                ))
            }
            Err(e) => {
                error!("Failed to fetch API endpoint: {e}");
                Err(command_error(&e))
            }
        }
    }

    pub fn store_get(&self, key: &str) -> Result<Option<Value>, String> {
        self.store.get(key).map_err(|e| command_error(&e))
    }

    /// Write a UI-owned key. The endpoint key is reserved for the supervisor.
    pub fn store_set(&self, key: &str, value: Value) -> Result<(), String> {
        reject_reserved(key)?;
        self.store.set(key, value).map_err(|e| {
            error!("Failed to save '{key}': {e}");
            command_error(&e)
        })
    }

    pub fn store_delete(&self, key: &str) -> Result<(), String> {
        reject_reserved(key)?;
        self.store.delete(key).map_err(|e| command_error(&e))
    }

    /// Port written by the backend to `<tmp>/port.txt`.
    pub fn read_temp_port_file(&self) -> Result<String, String> {
        read_temp_port_file().map_err(|e| {
            error!("Error reading the port file: {e}");
            command_error(&e)
        })
    }

    pub fn fs_exists(&self, path: &str) -> bool {
        absolute(path).exists()
    }

    pub fn fs_read_file(&self, path: &str) -> Result<String, String> {
        let path = absolute(path);
        std::fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
    }

    pub fn resources_path(&self) -> &Path {
        self.paths.resources_dir()
    }

    pub fn dirname(&self) -> &Path {
        self.paths.app_dir()
    }
}

fn reject_reserved(key: &str) -> Result<(), String> {
    if SUPERVISOR_OWNED_KEYS.contains(&key) {
        return Err(format!(
            "'{key}' is managed by the backend supervisor and cannot be changed"
        ));
    }
    Ok(())
}

fn absolute(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn command_error(e: &StoreError) -> String {
    format!("{e}\n\nHint: {}", e.recovery_hint())
}
