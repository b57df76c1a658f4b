//! Stale-while-revalidate cache.
//!
//! One `SwrCache` per entity kind, keyed by string. Cached values stay
//! readable while a refresh is in flight. The entry map is copy-on-write:
//! every mutation swaps in a new `Rc<HashMap>`, so a snapshot taken by a
//! render in progress never changes underneath it.
//!
//! There is no request sequencing. If two fetches for one key overlap, the
//! one that *completes* last wins, even if it was started first.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use serde::Serialize;
use tether_types::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch milliseconds of the fetch that produced `data`
    pub timestamp: i64,
}

/// What a key is doing right now, for spinner selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadPhase {
    Idle,
    /// No cached value yet; the UI shows a blocking spinner
    Loading,
    /// A cached value is shown while a newer one is fetched
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Return the cached value if present, fetch otherwise
    Cached,
    /// Always fetch, with loading/refreshing indication
    Forced,
    /// Always fetch, without touching the phase (background refresh)
    Silent,
}

pub struct SwrCache<T> {
    entries: RefCell<Rc<HashMap<String, CacheEntry<T>>>>,
    phases: RefCell<HashMap<String, LoadPhase>>,
    errors: RefCell<HashMap<String, String>>,
}

impl<T: Clone> SwrCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Rc::new(HashMap::new())),
            phases: RefCell::new(HashMap::new()),
            errors: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.borrow().get(key).map(|e| e.data.clone())
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Immutable view of every entry at this instant.
    pub fn snapshot(&self) -> Rc<HashMap<String, CacheEntry<T>>> {
        self.entries.borrow().clone()
    }

    pub fn phase(&self, key: &str) -> LoadPhase {
        self.phases
            .borrow()
            .get(key)
            .copied()
            .unwrap_or(LoadPhase::Idle)
    }

    pub fn error(&self, key: &str) -> Option<String> {
        self.errors.borrow().get(key).cloned()
    }

    /// Replace the entry for `key`, stamped with the current time.
    pub fn insert(&self, key: &str, data: T) {
        let entry = CacheEntry {
            data,
            timestamp: tether_types::now_ms(),
        };
        self.mutate(|map| {
            map.insert(key.to_string(), entry);
        });
    }

    pub fn remove(&self, key: &str) {
        if self.contains(key) {
            self.mutate(|map| {
                map.remove(key);
            });
        }
    }

    /// Drop every entry, phase and error.
    pub fn clear(&self) {
        *self.entries.borrow_mut() = Rc::new(HashMap::new());
        self.phases.borrow_mut().clear();
        self.errors.borrow_mut().clear();
    }

    /// Return or refresh the value for `key` according to `mode`.
    ///
    /// `fetch` is called at most once. On failure the previous entry is kept
    /// and the error is both recorded for `key` and returned. The phase is
    /// reset even when the returned future is dropped before completion.
    pub async fn fetch<F, Fut>(&self, key: &str, mode: FetchMode, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if mode == FetchMode::Cached {
            if let Some(data) = self.get(key) {
                return Ok(data);
            }
        }

        let guard = (mode != FetchMode::Silent).then(|| {
            let phase = if self.contains(key) {
                LoadPhase::Refreshing
            } else {
                LoadPhase::Loading
            };
            PhaseGuard::enter(&self.phases, key, phase)
        });

        let result = fetch().await;
        drop(guard);

        match result {
            Ok(data) => {
                self.insert(key, data.clone());
                self.errors.borrow_mut().remove(key);
                Ok(data)
            }
            Err(e) => {
                self.errors.borrow_mut().insert(key.to_string(), e.to_string());
                Err(e)
            }
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut HashMap<String, CacheEntry<T>>)) {
        let mut next = (**self.entries.borrow()).clone();
        f(&mut next);
        *self.entries.borrow_mut() = Rc::new(next);
    }
}

/// Holds a key's phase for the duration of a tracked fetch.
struct PhaseGuard<'a> {
    phases: &'a RefCell<HashMap<String, LoadPhase>>,
    key: String,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phases: &'a RefCell<HashMap<String, LoadPhase>>, key: &str, phase: LoadPhase) -> Self {
        phases.borrow_mut().insert(key.to_string(), phase);
        Self { phases, key: key.to_string() }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phases.borrow_mut().remove(&self.key);
    }
}

impl<T: Clone> Default for SwrCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
