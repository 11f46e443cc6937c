//! File-backed key-value store with persistence.
//!
//! Keeps every entry in memory and rewrites the whole file on each mutation.
//! The cache holds a handful of small lookups, so a full rewrite stays cheap
//! and the file is never left half-written.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use atlas_core::error::{AtlasError, Result};
use atlas_core::traits::KeyValueStore;

use crate::MemoryStore;

/// File-backed key-value store.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "ATLC"
/// version (1 byte): 1
/// count (8 bytes): number of entries, little-endian
/// entries (variable): bincode-serialized map of key bytes to value bytes
/// ```
#[derive(Debug)]
pub struct FileStore {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory copy of the file
    memory: MemoryStore,
}

/// File format magic bytes
const MAGIC: &[u8; 4] = b"ATLC";
/// Current file format version
const VERSION: u8 = 1;
/// Bytes before the serialized entries
const HEADER_LEN: usize = 13;

impl FileStore {
    /// Opens the store at `path`, creating the file (and its parent
    /// directories) if it does not exist yet.
    ///
    /// A file that exists but is not a readable store (another tool's cache,
    /// an older format, a truncated write) is replaced by an empty store.
    /// I/O failures are still returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path,
            memory: MemoryStore::new(),
        };

        if store.path.exists() {
            match store.load() {
                Ok(()) => {}
                Err(e) if e.is_format_error() => {
                    warn!(path = ?store.path, error = %e, "Unreadable cache file, starting empty");
                    store.memory = MemoryStore::new();
                    store.save()?;
                }
                Err(e) => return Err(e),
            }
        } else {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            store.save()?;
        }

        Ok(store)
    }

    /// Loads entries from the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    fn load(&mut self) -> Result<()> {
        let contents = fs::read(&self.path).map_err(|e| {
            AtlasError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open cache file: {}", e),
            ))
        })?;

        if contents.len() < HEADER_LEN {
            return Err(AtlasError::Storage("File too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(AtlasError::Storage("Invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != VERSION {
            return Err(AtlasError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
        let count = u64::from_le_bytes(count_bytes);

        let entries: BTreeMap<Vec<u8>, Vec<u8>> = bincode::deserialize(&contents[HEADER_LEN..])
            .map_err(|e| AtlasError::Serialization(e.to_string()))?;

        if entries.len() as u64 != count {
            return Err(AtlasError::Storage(format!(
                "Entry count mismatch: header says {}, found {}",
                count,
                entries.len()
            )));
        }

        info!(count, "Loaded cache store");
        self.memory = MemoryStore::from_entries(entries);
        Ok(())
    }

    /// Writes every entry to the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    fn save(&self) -> Result<()> {
        let entries = self.memory.entries();
        let count = entries.len() as u64;

        let serialized =
            bincode::serialize(entries).map_err(|e| AtlasError::Serialization(e.to_string()))?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&contents)?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.path)?;

        debug!(count, "Cache store saved");
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn contains(&self, key: &[u8]) -> bool {
        self.memory.contains(key)
    }

    fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.memory.get_raw(key)
    }

    fn set_raw(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.memory.set_raw(key, value)?;
        self.save()
    }

    fn delete_raw(&mut self, key: &[u8]) -> Result<()> {
        self.memory.delete_raw(key)?;
        self.save()
    }

    fn all_keys(&self) -> Vec<Vec<u8>> {
        self.memory.all_keys()
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}
