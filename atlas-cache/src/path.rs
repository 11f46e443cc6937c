//! Location of the cache file.

use std::ffi::OsString;
use std::path::PathBuf;

use atlas_core::constants::{CACHE_FILE_NAME, TOOL_NAME};

/// Returns where the cache file lives for the current user.
///
/// `$HOME/.config/ripe-atlas-tools/cache.db`, or `cache.db` in the system
/// temporary directory when `HOME` is not set.
pub fn default_cache_path() -> PathBuf {
    cache_path_for_home(std::env::var_os("HOME"))
}

/// Returns where the cache file lives for a given home directory.
pub fn cache_path_for_home(home: Option<OsString>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home)
            .join(".config")
            .join(TOOL_NAME)
            .join(CACHE_FILE_NAME),
        None => std::env::temp_dir().join(CACHE_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_under_home() {
        let path = cache_path_for_home(Some("/home/alice".into()));
        assert_eq!(
            path,
            PathBuf::from("/home/alice/.config/ripe-atlas-tools/cache.db")
        );
    }

    #[test]
    fn test_path_without_home() {
        assert_eq!(
            cache_path_for_home(None),
            std::env::temp_dir().join("cache.db")
        );
        assert_eq!(
            cache_path_for_home(Some(OsString::new())),
            std::env::temp_dir().join("cache.db")
        );
    }
}
