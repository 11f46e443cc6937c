//! # Atlas Cache
//!
//! Local, persistent, expiring cache for expensive lookups.
//!
//! - **Stores**: [`MemoryStore`] and the on-disk [`FileStore`]
//! - **Expiry**: [`ExpiringCache`] tags each value with an optional absolute
//!   expiry and evicts lazily on read
//! - **Memoization**: [`Memoizer`] caches a function's results keyed by its
//!   arguments
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use atlas_cache::{default_cache_path, ExpiringCache, FileStore, Memoizer};
//!
//! let mut cache = ExpiringCache::new(FileStore::open(default_cache_path())?);
//!
//! let geocode = Memoizer::new("geocode", Duration::from_secs(3600), |place: &str| lookup(place));
//! let coords = geocode.call(&mut cache, "Amsterdam")?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod expiring;
mod file;
mod memo;
mod memory;
mod path;

pub use expiring::{CacheStats, ExpiringCache};
pub use file::FileStore;
pub use memo::{memo_key, CallArgs, Memoizer};
pub use memory::MemoryStore;
pub use path::{cache_path_for_home, default_cache_path};

// Re-export the trait from core
pub use atlas_core::traits::KeyValueStore as Store;
