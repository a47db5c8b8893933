//! Expiring key-value store
//!
//! A concurrent map keyed by a stable id (usually an outbound message id)
//! where every entry carries its creation and expiry time. Expired entries are
//! evicted lazily on access and proactively by [`ExpiringStore::sweep`]. Once
//! evicted an entry is gone for good: updates never recreate it.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// A stored value with its lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<V> {
    /// The stored value
    pub value: V,
    /// When the entry was stored
    pub created_at: DateTime<Utc>,
    /// When the entry stops being visible
    pub expires_at: DateTime<Utc>,
}

impl<V> Stamped<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent map with per-entry expiry
#[derive(Debug, Clone)]
pub struct ExpiringStore<V> {
    entries: Arc<DashMap<String, Stamped<V>>>,
    ttl: Duration,
}

impl<V: Clone> ExpiringStore<V> {
    /// Create a store whose entries live for `ttl`
    #[must_use]
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a value, replacing any previous entry for the id
    pub fn insert(&self, id: impl Into<String>, value: V) -> Stamped<V> {
        self.insert_at(id, value, Utc::now())
    }

    pub(crate) fn insert_at(&self, id: impl Into<String>, value: V, now: DateTime<Utc>) -> Stamped<V> {
        let stamped = Stamped {
            value,
            created_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.entries.insert(id.into(), stamped.clone());
        stamped
    }

    /// Look up a live entry, evicting it if it has expired
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Stamped<V>> {
        self.get_at(id, Utc::now())
    }

    pub(crate) fn get_at(&self, id: &str, now: DateTime<Utc>) -> Option<Stamped<V>> {
        {
            let entry = self.entries.get(id)?;
            if !entry.is_expired(now) {
                return Some(entry.clone());
            }
        }
        self.entries.remove_if(id, |_, e| e.is_expired(now));
        None
    }

    /// Mutate a live entry in place, keeping its timestamps
    pub fn update<F>(&self, id: &str, f: F) -> Option<Stamped<V>>
    where
        F: FnOnce(&mut V),
    {
        self.update_at(id, f, Utc::now())
    }

    pub(crate) fn update_at<F>(&self, id: &str, f: F, now: DateTime<Utc>) -> Option<Stamped<V>>
    where
        F: FnOnce(&mut V),
    {
        {
            let mut entry = self.entries.get_mut(id)?;
            if !entry.is_expired(now) {
                f(&mut entry.value);
                return Some(entry.clone());
            }
        }
        self.entries.remove_if(id, |_, e| e.is_expired(now));
        None
    }

    /// Remove an entry. Expired entries are dropped and reported as absent.
    pub fn remove(&self, id: &str) -> Option<Stamped<V>> {
        let now = Utc::now();
        self.entries
            .remove(id)
            .map(|(_, e)| e)
            .filter(|e| !e.is_expired(now))
    }

    /// Atomically remove a live entry if `pred` accepts it
    pub fn take_if<F>(&self, id: &str, pred: F) -> Option<Stamped<V>>
    where
        F: FnOnce(&V) -> bool,
    {
        self.take_if_at(id, pred, Utc::now())
    }

    pub(crate) fn take_if_at<F>(&self, id: &str, pred: F, now: DateTime<Utc>) -> Option<Stamped<V>>
    where
        F: FnOnce(&V) -> bool,
    {
        let taken = self
            .entries
            .remove_if(id, |_, e| !e.is_expired(now) && pred(&e.value))
            .map(|(_, e)| e);
        if taken.is_none() {
            self.entries.remove_if(id, |_, e| e.is_expired(now));
        }
        taken
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Drop entries older than `max_age` regardless of expiry
    pub fn cleanup(&self, max_age: std::time::Duration) -> usize {
        let max_age = Duration::from_std(max_age).unwrap_or(Duration::MAX);
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, e| e.created_at > cutoff);
        before.saturating_sub(self.entries.len())
    }

    /// Whether a live entry exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of stored entries, including expired ones not yet swept
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
