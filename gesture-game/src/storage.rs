//! Key-value blob backends for `GestureStorage`.
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::GestureStorage;

/// In-process storage. Clones share the same blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw blob contents, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    /// Overwrite a blob directly, bypassing the store.
    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl GestureStorage for MemoryStorage {
    type Error = Infallible;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.get(key))
    }

    fn save_blob(&self, key: &str, json: &str) -> Result<(), Self::Error> {
        self.insert(key, json);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per blob.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the blob directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl GestureStorage for FileStorage {
    type Error = io::Error;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save_blob(&self, key: &str, json: &str) -> Result<(), Self::Error> {
        // Replace atomically via a sibling temp file.
        let path = self.blob_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gesture-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn memory_clones_share_blobs() {
        let storage = MemoryStorage::new();
        let view = storage.clone();
        storage.save_blob("PlayerStats", "{}").unwrap();
        assert_eq!(view.load_blob("PlayerStats").unwrap().as_deref(), Some("{}"));
        view.save_blob("PlayerStats", "{\"total_sessions\":1}").unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(
            storage.get("PlayerStats").as_deref(),
            Some("{\"total_sessions\":1}")
        );
    }

    #[test]
    fn file_storage_overwrites_and_tolerates_missing() {
        let storage = FileStorage::open(temp_dir("roundtrip")).unwrap();
        assert!(storage.load_blob("RecentSessions").unwrap().is_none());
        storage.save_blob("RecentSessions", "[]").unwrap();
        assert_eq!(
            storage.load_blob("RecentSessions").unwrap().as_deref(),
            Some("[]")
        );
        assert!(storage.root().join("RecentSessions.json").exists());
        storage.save_blob("RecentSessions", "[1]").unwrap();
        assert_eq!(
            storage.load_blob("RecentSessions").unwrap().as_deref(),
            Some("[1]")
        );
        assert!(!storage.root().join("RecentSessions.json.tmp").exists());
        let _ = fs::remove_dir_all(storage.root());
    }
}
