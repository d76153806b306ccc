use crate::StoreResult;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Flat key-value store shared between the host and the UI.
///
/// Writes are last-write-wins with no transactions. Implementations must be
/// safe to call from several components without external coordination.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value, `None` when the key was never written.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Typed helpers layered over [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
