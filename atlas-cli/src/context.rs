//! State shared by every command for one run.

use std::time::Duration;

use tracing::debug;

use atlas_cache::{ExpiringCache, FileStore, Memoizer, MemoryStore, Store};
use atlas_core::constants::GEOCODE_TTL_SECS;
use atlas_core::error::Result;

use crate::api::AtlasClient;
use crate::config::Settings;
use crate::geocode::{Coordinates, Geocoder};

/// Settings, clients and the cache, built once at startup.
///
/// The cache's clock is fixed when the context is built, so every expiry
/// decision in one run agrees.
pub struct AppContext<S> {
    settings: Settings,
    cache: ExpiringCache<S>,
    client: AtlasClient,
    geocoder: Geocoder,
}

impl AppContext<FileStore> {
    /// Opens the on-disk cache named by `settings`.
    pub fn open(settings: Settings) -> Result<Self> {
        debug!(path = %settings.cache_path.display(), "Opening cache");
        let store = FileStore::open(&settings.cache_path)?;
        Self::with_cache(settings, ExpiringCache::new(store))
    }
}

impl AppContext<MemoryStore> {
    /// Builds a context whose cache lives only for this run.
    pub fn ephemeral(settings: Settings) -> Result<Self> {
        Self::with_cache(settings, ExpiringCache::new(MemoryStore::new()))
    }
}

impl<S: Store> AppContext<S> {
    /// Builds a context around an existing cache.
    pub fn with_cache(settings: Settings, cache: ExpiringCache<S>) -> Result<Self> {
        let client = AtlasClient::new(&settings.api_url, settings.create_key.clone())?;
        let geocoder = Geocoder::new(settings.geocode_url.clone(), settings.geocode_key.clone())?;
        Ok(Self {
            settings,
            cache,
            client,
            geocoder,
        })
    }

    /// Returns the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the API client.
    pub fn client(&self) -> &AtlasClient {
        &self.client
    }

    /// Returns the cache.
    pub fn cache(&mut self) -> &mut ExpiringCache<S> {
        &mut self.cache
    }

    /// Geocodes `location`, remembering the answer for a week.
    pub fn location_to_degrees(&mut self, location: &str) -> Result<Coordinates> {
        let geocoder = &self.geocoder;
        Memoizer::new(
            "location2degrees",
            Duration::from_secs(GEOCODE_TTL_SECS),
            |location: &str| geocoder.lookup(location),
        )
        .bypass(!self.settings.use_cache)
        .call(&mut self.cache, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cache::memo_key;

    #[test]
    fn test_cached_location_skips_lookup() {
        let settings = Settings {
            geocode_url: "http://127.0.0.1:9/unreachable".into(),
            ..Settings::default()
        };
        let mut context = AppContext::ephemeral(settings).unwrap();

        let key = memo_key("location2degrees", "Amsterdam").unwrap();
        let cached = Coordinates { lat: 52.37, lng: 4.89 };
        context
            .cache()
            .set(&key, &cached, Some(Duration::from_secs(60)))
            .unwrap();

        assert_eq!(context.location_to_degrees("Amsterdam").unwrap(), cached);
        assert!(context.location_to_degrees("Rotterdam").is_err());
    }

    #[test]
    fn test_no_cache_always_looks_up() {
        let settings = Settings {
            geocode_url: "http://127.0.0.1:9/unreachable".into(),
            use_cache: false,
            ..Settings::default()
        };
        let mut context = AppContext::ephemeral(settings).unwrap();

        let key = memo_key("location2degrees", "Amsterdam").unwrap();
        context
            .cache()
            .set(&key, &Coordinates { lat: 1.0, lng: 2.0 }, None)
            .unwrap();

        assert!(context.location_to_degrees("Amsterdam").is_err());
    }

    #[test]
    fn test_open_file_cache() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            cache_path: dir.path().join("nested").join("cache.db"),
            ..Settings::default()
        };
        let context = AppContext::open(settings).unwrap();
        assert!(context.settings().cache_path.exists());
    }
}
