//! File-backed key-value store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::instrument;

use super::{
    EVENT_CHANNEL_CAPACITY, Entries, KeyValueStore, StorageError, StorageEvent, apply_update,
    publish,
};

/// [`KeyValueStore`] persisted as a JSON object in a single file.
///
/// Values are cached in memory and every mutation rewrites the file through a
/// temporary sibling followed by a rename, so the file on disk always holds a
/// complete batch. The in-memory view is only updated once the write has
/// succeeded.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

struct FileStoreInner {
    path: PathBuf,
    entries: RwLock<Entries>,
    tx: broadcast::Sender<StorageEvent>,
}

impl FileStore {
    /// Open the store at `path`, loading existing values if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path)?;
        tracing::debug!(keys = entries.len(), "Session storage loaded");

        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(FileStoreInner {
                path,
                entries: RwLock::new(entries),
                tx,
            }),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Re-read the backing file, picking up writes made by other processes.
    ///
    /// Publishes a change notification for every key whose value differs
    /// from the cached view.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn reload(&self) -> Result<(), StorageError> {
        let on_disk = read_entries(&self.inner.path)?;
        let mut entries = self
            .inner
            .entries
            .write()
            .map_err(|_| StorageError::Poisoned)?;

        let changed: Vec<String> = entries
            .keys()
            .chain(on_disk.keys())
            .filter(|key| entries.get(*key) != on_disk.get(*key))
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        *entries = on_disk;
        publish(&self.inner.tx, changed);
        Ok(())
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let path = &self.inner.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Entries, StorageError> {
    match fs::read_to_string(path) {
        Ok(json) if json.trim().is_empty() => Ok(Entries::new()),
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
        Err(e) => Err(e.into()),
    }
}

impl KeyValueStore for FileStore {
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
        if changed.is_empty() {
            return Ok(());
        }
        self.write_entries(&next)?;
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
        if entries.is_empty() {
            return Ok(());
        }
        self.write_entries(&Entries::new())?;
        entries.clear();
        let _ = self.inner.tx.send(StorageEvent::Cleared);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.tx.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("session.json");

        let store = FileStore::open(&path).unwrap();
        store
            .set_many(&[("isLoggedIn", "true"), ("userName", "Lin")])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("isLoggedIn").as_deref(), Some("true"));
        assert_eq!(reopened.get("userName").as_deref(), Some("Lin"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("isLoggedIn"), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Format(_))
        ));
    }

    #[test]
    fn test_remove_many_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store
            .set_many(&[("isLoggedIn", "true"), ("userName", "Lin"), ("other", "x")])
            .unwrap();
        store.remove_many(&["isLoggedIn", "userName"]).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("isLoggedIn"), None);
        assert_eq!(reopened.get("other").as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_reload_publishes_external_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let this_process = FileStore::open(&path).unwrap();
        this_process.set("userName", "Lin").unwrap();
        let mut events = this_process.subscribe();

        let other_process = FileStore::open(&path).unwrap();
        other_process.set("userName", "Chen").unwrap();

        this_process.reload().unwrap();
        assert_eq!(this_process.get("userName").as_deref(), Some("Chen"));
        assert_eq!(
            events.recv().await.unwrap(),
            StorageEvent::Changed {
                keys: vec!["userName".to_string()]
            }
        );
    }

    #[test]
    fn test_update_sets_and_removes_in_one_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store
            .set_many(&[("isLoggedIn", "false"), ("expireAt", "2030-01-01T00:00:00Z")])
            .unwrap();
        store
            .update(&[("isLoggedIn", "true")], &["expireAt"])
            .unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("isLoggedIn").as_deref(), Some("true"));
        assert_eq!(reopened.get("expireAt"), None);
        assert!(!path.with_extension("tmp").exists());
    }
}
