//! In-memory key-value store.
//!
//! Nothing survives the process. Used in tests and for `--no-cache` runs.

use std::collections::BTreeMap;

use atlas_core::error::{AtlasError, Result};
use atlas_core::traits::KeyValueStore;

/// In-memory key-value store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with entries.
    pub(crate) fn from_entries(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self { entries }
    }

    /// Returns the underlying entries.
    pub(crate) fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStore {
    fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete_raw(&mut self, key: &[u8]) -> Result<()> {
        match self.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(AtlasError::NotFound(String::from_utf8_lossy(key).into_owned())),
        }
    }

    fn all_keys(&self) -> Vec<Vec<u8>> {
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut store = MemoryStore::new();
        store.set_raw(b"alpha", b"1".to_vec()).unwrap();
        assert!(store.contains(b"alpha"));
        assert_eq!(store.get_raw(b"alpha"), Some(b"1".to_vec()));
        assert_eq!(store.get_raw(b"beta"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut store = MemoryStore::new();
        store.set_raw(b"alpha", b"1".to_vec()).unwrap();
        store.set_raw(b"alpha", b"2".to_vec()).unwrap();
        assert_eq!(store.get_raw(b"alpha"), Some(b"2".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_missing_fails() {
        let mut store = MemoryStore::new();
        let err = store.delete_raw(b"ghost").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_all_keys() {
        let mut store = MemoryStore::new();
        store.set_raw(b"b", vec![]).unwrap();
        store.set_raw(b"a", vec![]).unwrap();
        assert_eq!(store.all_keys(), vec![b"a".to_vec(), b"b".to_vec()]);
        store.delete_raw(b"a").unwrap();
        assert_eq!(store.all_keys(), vec![b"b".to_vec()]);
        assert!(!store.is_empty());
    }
}
