//! Expiring cache layered over a raw key-value store.
//!
//! Each value is stored together with an optional absolute expiry. Reads that
//! find an expired (or undecodable) entry delete it and report a miss, so the
//! store heals itself without a background sweeper.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use atlas_core::error::{AtlasError, Result};
use atlas_core::traits::KeyValueStore;

/// What actually lands in the store for each key.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    expires_at: Option<DateTime<Utc>>,
    /// JSON-encoded value
    payload: Vec<u8>,
}

impl StoredEntry {
    fn decode(key: &[u8], bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| AtlasError::CorruptEntry {
            key: display_key(key),
            reason: e.to_string(),
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Cache with per-entry expiry on top of a [`KeyValueStore`].
///
/// "Now" is captured once, when the cache is constructed, and used for every
/// expiry decision for the cache's lifetime. A command invocation therefore
/// sees a consistent view: an entry alive at startup stays alive until exit.
pub struct ExpiringCache<S> {
    store: S,
    now: DateTime<Utc>,
}

impl<S: KeyValueStore> ExpiringCache<S> {
    /// Creates a cache over `store`, pinning "now" to the current time.
    pub fn new(store: S) -> Self {
        Self::with_now(store, Utc::now())
    }

    /// Creates a cache over `store` with an explicit "now".
    pub fn with_now(store: S, now: DateTime<Utc>) -> Self {
        Self { store, now }
    }

    /// Returns the instant expiry decisions are made against.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the cache, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns true if the key is in the store.
    ///
    /// Expiry is not consulted: an expired key stays "contained" until a
    /// [`get`](Self::get) evicts it.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.store.contains(key)
    }

    /// Returns the live entry for `key`, evicting it if expired or corrupt.
    fn lookup(&mut self, key: &[u8]) -> Result<Option<StoredEntry>> {
        let Some(bytes) = self.store.get_raw(key) else {
            return Ok(None);
        };

        match StoredEntry::decode(key, &bytes) {
            Ok(entry) if entry.is_expired(self.now) => {
                debug!(key = %display_key(key), "Evicting expired cache entry");
                self.store.delete_raw(key)?;
                Ok(None)
            }
            Ok(entry) => Ok(Some(entry)),
            Err(err) => {
                warn!(error = %err, "Evicting corrupt cache entry");
                self.store.delete_raw(key)?;
                Ok(None)
            }
        }
    }

    /// Gets a cached value.
    ///
    /// Returns `None` if the key is absent or expired. An entry that cannot be
    /// decoded as `T` is treated as corrupt: it is deleted and reported as a miss.
    pub fn get<T: DeserializeOwned>(&mut self, key: &[u8]) -> Result<Option<T>> {
        let Some(entry) = self.lookup(key)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&entry.payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let err = AtlasError::CorruptEntry {
                    key: display_key(key),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Evicting corrupt cache entry");
                self.store.delete_raw(key)?;
                Ok(None)
            }
        }
    }

    /// Gets a cached value, falling back to `default` on a miss.
    pub fn get_or<T: DeserializeOwned>(&mut self, key: &[u8], default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Caches a value.
    ///
    /// With a `ttl` the entry expires at `now + ttl`; without one it never
    /// expires. A ttl too large to represent is treated as no expiry.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &[u8],
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let expires_at = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| self.now.checked_add_signed(ttl))
        });

        let entry = StoredEntry {
            expires_at,
            payload: serde_json::to_vec(value)?,
        };
        let bytes =
            bincode::serialize(&entry).map_err(|e| AtlasError::Serialization(e.to_string()))?;

        self.store.set_raw(key, bytes)
    }

    /// Deletes a key.
    ///
    /// Fails with [`AtlasError::NotFound`] if the key is absent.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.store.delete_raw(key)
    }

    /// Removes `key` if given (a no-op if it is absent), otherwise every key.
    pub fn clear(&mut self, key: Option<&[u8]>) -> Result<()> {
        match key {
            Some(key) => {
                if self.store.contains(key) {
                    self.store.delete_raw(key)?;
                }
            }
            None => {
                for key in self.store.all_keys() {
                    self.store.delete_raw(&key)?;
                }
            }
        }
        Ok(())
    }

    /// Evicts every expired or corrupt entry, returning how many were removed.
    ///
    /// Reads evict on their own, so this is housekeeping only.
    pub fn expire(&mut self) -> Result<usize> {
        let mut evicted = 0;
        for key in self.store.all_keys() {
            if self.lookup(&key)?.is_none() {
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    /// Returns every key in the store, expired ones included.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.store.all_keys()
    }

    /// Returns cache statistics without evicting anything.
    pub fn stats(&self) -> CacheStats {
        let keys = self.store.all_keys();
        let expired = keys
            .iter()
            .filter(|key| {
                self.store
                    .get_raw(key)
                    .map(|bytes| {
                        StoredEntry::decode(key, &bytes)
                            .map_or(true, |entry| entry.is_expired(self.now))
                    })
                    .unwrap_or(false)
            })
            .count();

        CacheStats {
            total_entries: keys.len(),
            expired_entries: expired,
            valid_entries: keys.len().saturating_sub(expired),
        }
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired or undecodable entries
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore};
    use chrono::TimeZone;
    use tempfile::tempdir;
    use test_case::test_case;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn later(secs: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_set_get() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", "value", None).unwrap();
        assert_eq!(cache.get::<String>(b"k").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_miss_returns_default() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        assert_eq!(cache.get::<u32>(b"missing").unwrap(), None);
        assert_eq!(cache.get_or(b"missing", 7u32).unwrap(), 7);
    }

    #[test_case(0, false ; "same instant")]
    #[test_case(59, false ; "just before expiry")]
    #[test_case(60, true ; "exactly at expiry")]
    #[test_case(3600, true ; "long after expiry")]
    fn test_expiry_boundary(elapsed: i64, expired: bool) {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", &1u32, Some(Duration::from_secs(60))).unwrap();

        let mut cache = ExpiringCache::with_now(cache.into_store(), later(elapsed));
        let value = cache.get::<u32>(b"k").unwrap();
        assert_eq!(value.is_none(), expired);
        assert_eq!(cache.contains(b"k"), !expired);
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", &1u32, Some(Duration::ZERO)).unwrap();
        assert_eq!(cache.get::<u32>(b"k").unwrap(), None);
        assert!(!cache.contains(b"k"));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", &[1, 2, 3], None).unwrap();

        let mut cache = ExpiringCache::with_now(cache.into_store(), later(10 * 365 * 86_400));
        assert_eq!(cache.get::<Vec<u8>>(b"k").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(cache.expire().unwrap(), 0);
    }

    #[test]
    fn test_contains_ignores_expiry() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", &1u32, Some(Duration::from_secs(1))).unwrap();

        let mut cache = ExpiringCache::with_now(cache.into_store(), later(5));
        assert!(cache.contains(b"k"));
        assert_eq!(cache.get::<u32>(b"k").unwrap(), None);
        assert!(!cache.contains(b"k"));
    }

    #[test]
    fn test_falsy_values_are_hits() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"zero", &0u32, None).unwrap();
        cache.set(b"empty", &Vec::<u32>::new(), None).unwrap();
        cache.set(b"false", &false, None).unwrap();

        assert_eq!(cache.get::<u32>(b"zero").unwrap(), Some(0));
        assert_eq!(cache.get::<Vec<u32>>(b"empty").unwrap(), Some(vec![]));
        assert_eq!(cache.get::<bool>(b"false").unwrap(), Some(false));
    }

    #[test]
    fn test_corrupt_entry_is_evicted() {
        let mut store = MemoryStore::new();
        store.set_raw(b"bad", b"\xff\xfe not an entry".to_vec()).unwrap();

        let mut cache = ExpiringCache::with_now(store, t0());
        assert_eq!(cache.stats().expired_entries, 1);
        assert_eq!(cache.get::<u32>(b"bad").unwrap(), None);
        assert!(!cache.contains(b"bad"));
    }

    #[test]
    fn test_wrong_type_is_evicted() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"k", "text", None).unwrap();
        assert_eq!(cache.get::<u32>(b"k").unwrap(), None);
        assert!(!cache.contains(b"k"));
    }

    #[test]
    fn test_clear_single_key() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"a", &1u32, None).unwrap();
        cache.set(b"b", &2u32, None).unwrap();

        cache.clear(Some(b"a".as_slice())).unwrap();
        assert!(!cache.contains(b"a"));
        assert!(cache.contains(b"b"));

        // Absent key is a no-op
        cache.clear(Some(b"a".as_slice())).unwrap();
    }

    #[test]
    fn test_clear_all() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        for key in [b"a", b"b", b"c"] {
            cache.set(key, &1u32, None).unwrap();
        }

        cache.clear(None).unwrap();
        for key in [b"a", b"b", b"c"] {
            assert!(!cache.contains(key));
        }
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_delete_absent_key_fails() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        assert!(cache.delete(b"ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_expire_and_stats() {
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), t0());
        cache.set(b"short", &1u32, Some(Duration::from_secs(10))).unwrap();
        cache.set(b"long", &2u32, Some(Duration::from_secs(1000))).unwrap();
        cache.set(b"forever", &3u32, None).unwrap();

        let mut cache = ExpiringCache::with_now(cache.into_store(), later(100));
        assert_eq!(
            cache.stats(),
            CacheStats {
                total_entries: 3,
                expired_entries: 1,
                valid_entries: 2,
            }
        );

        assert_eq!(cache.expire().unwrap(), 1);
        assert!(!cache.contains(b"short"));
        assert!(cache.contains(b"long"));
        assert!(cache.contains(b"forever"));
    }

    #[test]
    fn test_file_backed_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let mut cache = ExpiringCache::with_now(FileStore::open(&path).unwrap(), t0());
            cache.set(b"k", &(52.37, 4.89), Some(Duration::from_secs(60))).unwrap();
        }

        let mut cache = ExpiringCache::with_now(FileStore::open(&path).unwrap(), later(30));
        assert_eq!(cache.get::<(f64, f64)>(b"k").unwrap(), Some((52.37, 4.89)));

        let mut cache = ExpiringCache::with_now(FileStore::open(&path).unwrap(), later(90));
        assert_eq!(cache.get::<(f64, f64)>(b"k").unwrap(), None);

        // Eviction reached the disk
        let store = FileStore::open(&path).unwrap();
        assert!(store.is_empty());
    }
}
