//! Capped, insertion-ordered id sets.
//!
//! The read and dismissed id-sets are the only persisted state the feed
//! owns. Both are capped so storage cannot grow without bound; when the cap
//! is exceeded the oldest entry (by insertion order, not event recency) is
//! evicted. Eviction can resurface a long-dismissed notification, which is
//! an accepted trade-off of the cap.

use crate::store::{StateStore, StoreError};
use tracing::warn;

/// Maximum ids retained per set.
pub const RETAINED_IDS: usize = 200;

/// An insertion-ordered string set with oldest-first eviction at a cap.
#[derive(Debug, Clone, Default)]
pub struct CappedIdSet {
    ids: Vec<String>,
    cap: usize,
}

impl CappedIdSet {
    /// Empty set with the standard cap.
    pub fn new() -> Self {
        Self::with_cap(RETAINED_IDS)
    }

    /// Empty set with an explicit cap (tests exercise small caps).
    pub fn with_cap(cap: usize) -> Self {
        Self {
            ids: Vec::new(),
            cap,
        }
    }

    /// Load a set from a store key, defaulting to empty on any failure.
    pub fn load(store: &dyn StateStore, key: &str) -> Self {
        let mut set = Self::new();

        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return set,
            Err(e) => {
                warn!("id set '{}' unreadable, starting empty: {}", key, e);
                return set;
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => {
                for id in ids {
                    set.insert(id);
                }
            }
            Err(e) => warn!("id set '{}' is not a JSON array, starting empty: {}", key, e),
        }

        set
    }

    /// Persist the whole set to a store key (whole-document overwrite).
    pub fn save(&self, store: &mut dyn StateStore, key: &str) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.ids).unwrap_or_else(|_| "[]".to_string());
        store.set(key, &raw)
    }

    /// Insert an id, evicting the oldest entry past the cap.
    ///
    /// Re-inserting an existing id is a no-op and does not refresh its
    /// position in the eviction order.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        if self.ids.len() > self.cap {
            let excess = self.ids.len() - self.cap;
            self.ids.drain(..excess);
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
