//! Pick the best available storage backend.
//!
//! Priority: IndexedDB → Memory (fallback). Workspaces only survive a
//! reload with IndexedDB.

use std::rc::Rc;
use tether_core::ports::StoragePort;
use super::{IndexedDbStorage, MemoryStorage};

/// Never fails: the memory backend is always available.
pub async fn auto_detect_storage() -> Rc<dyn StoragePort> {
    match IndexedDbStorage::open().await {
        Ok(idb) => {
            log::info!("Storage backend: IndexedDB");
            Rc::new(idb)
        }
        Err(e) => {
            log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}
