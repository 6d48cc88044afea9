use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::{CredentialStore, StoreError};
use crate::error::Error;
use crate::types::Credential;

/// In-process credential storage. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

/// Credential storage backed by a JSON object on disk.
///
/// The file is read on every `load`, so a credential written by another
/// process is picked up on the next request.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, slots: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(slots)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut slots = self.read_all()?;
        slots.insert(key.to_owned(), value.to_owned());
        self.write_all(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut slots = self.read_all()?;
        if slots.remove(key).is_some() {
            self.write_all(&slots)?;
        }
        Ok(())
    }
}

/// The single credential slot: a store plus the fixed key it lives under.
#[derive(Clone)]
pub(crate) struct CredentialSlot {
    store: Arc<dyn CredentialStore>,
    key: String,
}

impl CredentialSlot {
    pub(crate) fn new(store: Arc<dyn CredentialStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Current credential. Unreadable storage counts as "no credential".
    pub(crate) fn load(&self) -> Option<Credential> {
        match self.store.load(&self.key) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Credential::from),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Credential store read failed");
                None
            }
        }
    }

    pub(crate) fn save(&self, credential: &Credential) -> Result<(), Error> {
        self.store
            .save(&self.key, credential.expose())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    pub(crate) fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(error = %e, key = %self.key, "Credential store delete failed");
        }
    }

    /// Clear the slot unless it already holds a credential other than
    /// `rejected`, which means a refresh replaced it meanwhile.
    pub(crate) fn clear_rejected(&self, rejected: Option<&Credential>) {
        match (self.load(), rejected) {
            (Some(current), Some(rejected)) if current != *rejected => {
                tracing::debug!("Credential already replaced, keeping it");
            }
            (None, _) => {}
            _ => self.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        store.save("token", "abc").unwrap();

        assert_eq!(store.load("token").unwrap().as_deref(), Some("abc"));
        store.remove("token").unwrap();
        assert_eq!(store.load("token").unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_slots() {
        let store = MemoryCredentialStore::new();
        let other = store.clone();
        store.save("token", "abc").unwrap();

        assert_eq!(other.load("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        FileCredentialStore::new(&path).save("token", "t1").unwrap();
        let reopened = FileCredentialStore::new(&path);

        assert_eq!(reopened.load("token").unwrap().as_deref(), Some("t1"));
        reopened.remove("token").unwrap();
        assert_eq!(FileCredentialStore::new(&path).load("token").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.json"));

        assert_eq!(store.load("token").unwrap(), None);
        store.remove("token").unwrap();
    }

    #[test]
    fn test_slot_keeps_replaced_credential() {
        let store = MemoryCredentialStore::new();
        let slot = CredentialSlot::new(Arc::new(store.clone()), "token");
        slot.save(&Credential::new("fresh")).unwrap();

        slot.clear_rejected(Some(&Credential::new("stale")));
        assert_eq!(slot.load(), Some(Credential::new("fresh")));

        slot.clear_rejected(Some(&Credential::new("fresh")));
        assert_eq!(slot.load(), None);
    }

    #[test]
    fn test_slot_clears_when_nothing_was_presented() {
        let store = MemoryCredentialStore::new();
        let slot = CredentialSlot::new(Arc::new(store), "token");
        slot.save(&Credential::new("t1")).unwrap();

        slot.clear_rejected(None);
        assert_eq!(slot.load(), None);
    }
}
