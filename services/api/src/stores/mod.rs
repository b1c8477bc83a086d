//! services/api/src/stores/mod.rs
//!
//! Ordered JSON collections kept under a single key of a `KeyValueStore`.
//! Every read-modify-write is last-writer-wins; there is no locking.

pub mod favorites;
pub mod history;

pub use favorites::FavoritesStore;
pub use history::MoodHistoryStore;

use qalbu_core::ports::{KeyValueStore, PortError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend failed: {0}")]
    Backend(#[from] PortError),
    #[error("Failed to encode stored collection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds the per-owner storage key.
pub fn scoped_key(base: &str, owner: &str) -> String {
    format!("{}:{}", base, owner)
}

/// One element of a stored array. Elements that do not decode as `T` are kept
/// as raw JSON so a rewrite puts them back unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum Entry<T> {
    Known(T),
    Raw(Value),
}

impl<T> Entry<T> {
    pub(crate) fn known(&self) -> Option<&T> {
        match self {
            Entry::Known(item) => Some(item),
            Entry::Raw(_) => None,
        }
    }

    pub(crate) fn known_mut(&mut self) -> Option<&mut T> {
        match self {
            Entry::Known(item) => Some(item),
            Entry::Raw(_) => None,
        }
    }
}

/// Reads the collection under `key`. An absent key is empty, and so is a payload
/// that is not a JSON array. Elements that fail to decode are logged and kept raw.
pub(crate) async fn load_collection<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<Entry<T>>, StorageError> {
    let Some(raw) = kv.get(key).await? else {
        return Ok(Vec::new());
    };
    let values = match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(key, error = %e, "Stored collection is unreadable; treating it as empty.");
            return Ok(Vec::new());
        }
    };
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match T::deserialize(&value) {
            Ok(item) => Entry::Known(item),
            Err(e) => {
                warn!(key, index, error = %e, "Skipping an unreadable stored entry.");
                Entry::Raw(value)
            }
        })
        .collect())
}

pub(crate) async fn save_collection<T: Serialize>(
    kv: &dyn KeyValueStore,
    key: &str,
    entries: &[Entry<T>],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(entries)?;
    kv.set(key, &json).await?;
    Ok(())
}
