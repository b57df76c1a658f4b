//! JSON records on top of [`StoragePort`].
//!
//! Reads never fail: a missing key, a backend error or unparseable JSON all
//! read as `None`, with a warning logged for the latter two.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tether_types::Result;
use crate::ports::StoragePort;

pub async fn load<T: DeserializeOwned>(storage: &dyn StoragePort, key: &str) -> Option<T> {
    let bytes = match storage.get(key).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read {} from {}: {}", key, storage.backend_name(), e);
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding corrupt record {}: {}", key, e);
            None
        }
    }
}

/// Serialize `value` and write it in place of whatever was stored.
pub async fn save<T: Serialize + ?Sized>(
    storage: &dyn StoragePort,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    storage.set(key, &bytes).await
}

pub async fn clear(storage: &dyn StoragePort, key: &str) -> Result<()> {
    storage.delete(key).await
}
