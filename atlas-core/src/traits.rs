//! Common traits for atlas.
//!
//! These traits define the seams between the cache, the aggregator and the
//! outer client, so each side can be swapped for an in-memory stand-in in tests.

use crate::error::Result;
use crate::types::AttributeValue;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORD TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A record with named, queryable attributes.
pub trait ProbeRecord {
    /// Numeric identifier of the record.
    fn id(&self) -> u64;

    /// Looks up an attribute by name.
    ///
    /// Returns [`AttributeValue::Null`] when the attribute exists but carries no
    /// value, and [`AtlasError::UnknownAttribute`](crate::AtlasError::UnknownAttribute)
    /// when the record has no attribute with this name at all.
    fn attribute(&self, name: &str) -> Result<AttributeValue>;
}

impl<R: ProbeRecord + ?Sized> ProbeRecord for &R {
    fn id(&self) -> u64 {
        (**self).id()
    }

    fn attribute(&self, name: &str) -> Result<AttributeValue> {
        (**self).attribute(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY-VALUE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Byte-string to byte-string storage underneath the expiring cache.
///
/// Implementations might use:
/// - In-memory storage (for testing and cache-less runs)
/// - A single file on disk (for the command-line tool)
///
/// Every mutating call is durable by the time it returns; there is no
/// separate flush step.
pub trait KeyValueStore {
    /// Returns true if the key is present.
    fn contains(&self, key: &[u8]) -> bool;

    /// Returns the stored bytes for a key.
    fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Inserts or overwrites a key.
    fn set_raw(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Removes a key.
    ///
    /// Fails with [`AtlasError::NotFound`](crate::AtlasError::NotFound) if the key is absent.
    fn delete_raw(&mut self, key: &[u8]) -> Result<()>;

    /// Returns every key currently stored.
    fn all_keys(&self) -> Vec<Vec<u8>>;

    /// Returns the number of stored keys.
    fn len(&self) -> usize {
        self.all_keys().len()
    }

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
