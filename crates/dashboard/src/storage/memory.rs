//! In-memory key-value store.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{
    EVENT_CHANNEL_CAPACITY, Entries, KeyValueStore, StorageError, StorageEvent, apply_update,
    publish,
};

/// In-memory [`KeyValueStore`].
///
/// Cloning yields another handle onto the same key space and change channel.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    entries: RwLock<Entries>,
    tx: broadcast::Sender<StorageEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryStoreInner {
                entries: RwLock::new(Entries::new()),
                tx,
            }),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StorageError> {
        let mut entries = self
            .inner
            .entries
            .write()
            .map_err(|_| StorageError::Poisoned)?;
        let (next, changed) = apply_update(&entries, set, remove);
        *entries = next;
        publish(&self.inner.tx, changed);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self
            .inner
            .entries
            .write()
            .map_err(|_| StorageError::Poisoned)?;
        if !entries.is_empty() {
            entries.clear();
            let _ = self.inner.tx.send(StorageEvent::Cleared);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.tx.subscribe()
    }
}
