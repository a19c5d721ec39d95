//! Dependency-versioned memoization.
//!
//! Every input a derived value can depend on has a [`DepKey`]. The
//! [`VersionTable`] maps each key to a version number which is bumped when
//! the input changes. A [`Memo`] entry records the versions of its declared
//! keys at computation time and is reused only while all of them still match.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::model::ThreadIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepKey {
    /// The thread's own tables.
    Thread(ThreadIndex),
    CommittedRange,
    PreviewSelection,
    FilterSettings(ThreadIndex),
}

pub type Version = u64;

// Shared by every table so a (key, version) pair from one state never
// matches one from another.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    versions: HashMap<DepKey, Version>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version of `key`; 0 if it was never bumped.
    pub fn get(&self, key: DepKey) -> Version {
        self.versions.get(&key).copied().unwrap_or(0)
    }

    pub fn bump(&mut self, key: DepKey) -> Version {
        let version = NEXT_VERSION.fetch_add(1, Ordering::Relaxed);
        self.versions.insert(key, version);
        version
    }

    pub fn snapshot(&self, deps: &[DepKey]) -> Vec<Version> {
        deps.iter().map(|&key| self.get(key)).collect()
    }
}

struct Entry<V> {
    deps: Vec<DepKey>,
    seen: Vec<Version>,
    value: Arc<V>,
}

impl<V> Entry<V> {
    fn is_current(&self, versions: &VersionTable) -> bool {
        versions.snapshot(&self.deps) == self.seen
    }
}

/// A cache of derived values keyed by `K`.
///
/// The lock is held across the validity check and the recomputation, so two
/// callers racing on one memo get the same value and compute it once.
/// `compute` must not re-enter the same memo.
///
/// A recompute also evicts every entry whose dependencies have moved, so
/// keys that are never asked for again don't pile up.
pub struct Memo<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, Entry<V>>>,
    computations: AtomicUsize,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn get_or_compute(
        &self,
        key: K,
        deps: &[DepKey],
        versions: &VersionTable,
        compute: impl FnOnce() -> Arc<V>,
    ) -> Arc<V> {
        let seen = versions.snapshot(deps);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(&key) {
            if entry.seen == seen {
                return Arc::clone(&entry.value);
            }
        }

        debug!("{}: recomputing {:?}", self.name, key);
        self.computations.fetch_add(1, Ordering::Relaxed);
        entries.retain(|_, entry| entry.is_current(versions));
        let value = compute();
        entries.insert(
            key,
            Entry {
                deps: deps.to_vec(),
                seen,
                value: Arc::clone(&value),
            },
        );
        value
    }

    /// How many times this memo has run its computation.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<K, V> Debug for Memo<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.name)
            .field("computations", &self.computations.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
