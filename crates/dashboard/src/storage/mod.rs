//! Durable key-value storage for session fields.
//!
//! The session store and profile adapter only see the [`KeyValueStore`] port.
//! Two adapters exist:
//!
//! - [`MemoryStore`] - in-process map; cloned handles share one key space,
//!   the way several browser tabs share one origin's storage
//! - [`FileStore`] - JSON file on disk, written atomically
//!
//! Every mutation that changes at least one key publishes a [`StorageEvent`]
//! to all subscribers, including subscribers on other handles of the same
//! store.

mod file;
mod memory;

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::broadcast;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Capacity of the change notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors raised by storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not contain a JSON string map.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),

    /// A writer panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Notification that persisted values changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// The listed keys were set or removed.
    Changed { keys: Vec<String> },
    /// Every key was removed.
    Cleared,
}

/// A string key-value store with change notifications.
///
/// Batch operations are atomic: readers observe either none or all of a
/// batch, never a partial application.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `set` and remove `remove` as one batch.
    ///
    /// A key named in both ends up removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be made durable; the store is
    /// left unchanged in that case.
    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal could not be made durable.
    fn clear(&self) -> Result<(), StorageError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    /// Write several values as one batch.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::update`].
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(entries, &[])
    }

    /// Remove several keys as one batch. Absent keys are ignored.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::update`].
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(&[], keys)
    }

    /// Write a single value.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::update`].
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(&[(key, value)], &[])
    }

    /// Remove a single key.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::update`].
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(&[], &[key])
    }
}

type Entries = BTreeMap<String, String>;

/// Apply a batch of writes and removals to a copy of `entries`, returning the
/// new map and the keys whose values actually changed.
fn apply_update(
    entries: &Entries,
    set: &[(&str, &str)],
    remove: &[&str],
) -> (Entries, Vec<String>) {
    let mut next = entries.clone();
    for (key, value) in set {
        next.insert((*key).to_string(), (*value).to_string());
    }
    for key in remove {
        next.remove(*key);
    }

    let mut changed: Vec<String> = Vec::new();
    for key in set.iter().map(|(key, _)| *key).chain(remove.iter().copied()) {
        if entries.get(key) != next.get(key) && !changed.iter().any(|k| k == key) {
            changed.push(key.to_string());
        }
    }
    (next, changed)
}

/// Publish a change, ignoring the case where nobody is listening.
fn publish(tx: &broadcast::Sender<StorageEvent>, changed: Vec<String>) {
    if !changed.is_empty() {
        let _ = tx.send(StorageEvent::Changed { keys: changed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update_reports_only_changes() {
        let mut entries = Entries::new();
        entries.insert("a".to_string(), "1".to_string());

        let (next, changed) = apply_update(&entries, &[("a", "1"), ("b", "2")], &[]);
        assert_eq!(changed, vec!["b".to_string()]);
        assert_eq!(next.get("b").map(String::as_str), Some("2"));
        // Input untouched
        assert!(!entries.contains_key("b"));
    }

    #[test]
    fn test_apply_update_ignores_absent_removals() {
        let mut entries = Entries::new();
        entries.insert("a".to_string(), "1".to_string());

        let (next, changed) = apply_update(&entries, &[], &["a", "missing"]);
        assert_eq!(changed, vec!["a".to_string()]);
        assert!(next.is_empty());
    }

    #[test]
    fn test_apply_update_sets_and_removes_together() {
        let mut entries = Entries::new();
        entries.insert("expireAt".to_string(), "2030-01-01T00:00:00Z".to_string());

        let (next, changed) =
            apply_update(&entries, &[("isLoggedIn", "true")], &["expireAt"]);
        assert_eq!(
            changed,
            vec!["isLoggedIn".to_string(), "expireAt".to_string()]
        );
        assert_eq!(next.get("isLoggedIn").map(String::as_str), Some("true"));
        assert!(!next.contains_key("expireAt"));
    }
}
