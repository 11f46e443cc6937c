//! Runtime settings.

use std::path::PathBuf;

use atlas_cache::default_cache_path;
use atlas_core::constants::{DEFAULT_API_URL, DEFAULT_GEOCODE_URL};

/// Settings read from the environment (and an optional `.env` file).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the measurement platform
    pub api_url: String,
    /// API key used to create measurements
    pub create_key: Option<String>,
    /// Geocoding endpoint
    pub geocode_url: String,
    /// API key sent to the geocoding endpoint
    pub geocode_key: Option<String>,
    /// Location of the cache file
    pub cache_path: PathBuf,
    /// Whether memoized lookups read and write the cache
    pub use_cache: bool,
}

impl Settings {
    /// Loads settings from `ATLAS_*` environment variables, falling back to
    /// compiled-in defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            api_url: non_empty("ATLAS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            create_key: non_empty("ATLAS_CREATE_KEY"),
            geocode_url: non_empty("ATLAS_GEOCODE_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODE_URL.into()),
            geocode_key: non_empty("ATLAS_GEOCODE_KEY"),
            cache_path: non_empty("ATLAS_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_path),
            use_cache: non_empty("ATLAS_NO_CACHE")
                .map(|v| v == "false" || v == "0")
                .unwrap_or(true),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.geocode_url, DEFAULT_GEOCODE_URL);
        assert!(settings.create_key.is_none());
        assert!(settings.use_cache);
        assert!(settings.cache_path.ends_with("cache.db"));
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("ATLAS_API_URL", "http://localhost:8000"),
            ("ATLAS_CREATE_KEY", "secret"),
            ("ATLAS_CACHE_PATH", "/tmp/atlas/cache.db"),
        ]);
        assert_eq!(settings.api_url, "http://localhost:8000");
        assert_eq!(settings.create_key.as_deref(), Some("secret"));
        assert_eq!(settings.cache_path, PathBuf::from("/tmp/atlas/cache.db"));
    }

    #[test]
    fn test_no_cache_flag() {
        assert!(!settings(&[("ATLAS_NO_CACHE", "1")]).use_cache);
        assert!(!settings(&[("ATLAS_NO_CACHE", "true")]).use_cache);
        assert!(settings(&[("ATLAS_NO_CACHE", "0")]).use_cache);
        assert!(settings(&[("ATLAS_NO_CACHE", "")]).use_cache);
    }

    #[test]
    fn test_blank_key_is_absent() {
        assert!(settings(&[("ATLAS_CREATE_KEY", "  ")]).create_key.is_none());
    }
}
