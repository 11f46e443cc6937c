//! Local cache housekeeping.

use std::io::Write;

use colored::*;
use dialoguer::Confirm;

use atlas_cache::{ExpiringCache, Store};
use atlas_core::error::{AtlasError, Result};

use super::{CacheArgs, CacheCommand};

/// Run the cache command.
pub fn run<S: Store>(args: &CacheArgs, cache: &mut ExpiringCache<S>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match &args.command {
        CacheCommand::Clear { key, yes } => {
            if key.is_none() && !yes && !confirm_clear_all()? {
                println!("{}", "Nothing removed.".yellow());
                return Ok(());
            }
            clear(cache, key.as_deref(), &mut stdout)
        }
        CacheCommand::Expire => expire(cache, &mut stdout),
        CacheCommand::Stats => stats(cache, &mut stdout),
        CacheCommand::Keys => keys(cache, &mut stdout),
    }
}

fn confirm_clear_all() -> Result<bool> {
    Confirm::new()
        .with_prompt("Remove every cached entry?")
        .default(false)
        .interact()
        .map_err(|e| AtlasError::Io(std::io::Error::other(e.to_string())))
}

/// Removes `key` (given as printed by [`keys`]), or every key.
pub fn clear<S: Store, W: Write>(
    cache: &mut ExpiringCache<S>,
    key: Option<&str>,
    out: &mut W,
) -> Result<()> {
    match key {
        Some(key) => {
            let raw = decode_key(key);
            if !cache.contains(&raw) {
                return Err(AtlasError::NotFound(format!("cache key {}", key)));
            }
            cache.clear(Some(raw.as_slice()))?;
            writeln!(out, "{} {}", "Removed".green(), key)?;
        }
        None => {
            let count = cache.keys().len();
            cache.clear(None)?;
            writeln!(out, "{} {} entries", "Removed".green(), count)?;
        }
    }
    Ok(())
}

/// Evicts expired entries.
pub fn expire<S: Store, W: Write>(cache: &mut ExpiringCache<S>, out: &mut W) -> Result<()> {
    let evicted = cache.expire()?;
    writeln!(out, "{} {} expired entries", "Removed".green(), evicted)?;
    Ok(())
}

/// Prints entry counts.
pub fn stats<S: Store, W: Write>(cache: &ExpiringCache<S>, out: &mut W) -> Result<()> {
    let stats = cache.stats();
    writeln!(out, "{}", "Cache statistics".cyan().bold())?;
    writeln!(out, "   {} {}", "As of:".dimmed(), cache.now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "   {} {}", "Total:".dimmed(), stats.total_entries)?;
    writeln!(out, "   {} {}", "Valid:".dimmed(), stats.valid_entries)?;
    writeln!(out, "   {} {}", "Expired:".dimmed(), stats.expired_entries)?;
    Ok(())
}

/// Prints every stored key, one per line.
pub fn keys<S: Store, W: Write>(cache: &ExpiringCache<S>, out: &mut W) -> Result<()> {
    for key in cache.keys() {
        writeln!(out, "{}", display_key(&key))?;
    }
    Ok(())
}

const HEX_PREFIX: &str = "hex:";

/// Shows a key as text when it is printable UTF-8, as `hex:...` otherwise.
pub fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(text) if !text.starts_with(HEX_PREFIX) && !text.chars().any(char::is_control) => {
            text.to_string()
        }
        _ => format!("{}{}", HEX_PREFIX, hex::encode(key)),
    }
}

/// Reverses [`display_key`].
pub fn decode_key(shown: &str) -> Vec<u8> {
    shown
        .strip_prefix(HEX_PREFIX)
        .and_then(|digits| hex::decode(digits).ok())
        .unwrap_or_else(|| shown.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cache::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use test_case::test_case;

    fn cache() -> ExpiringCache<MemoryStore> {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut cache = ExpiringCache::with_now(MemoryStore::new(), now);
        cache.set(b"memo:geo:[\"Amsterdam\"]", &[52.37, 4.89], None).unwrap();
        cache.set(&[0xff, 0x00], &1u8, None).unwrap();
        cache.set(b"stale", &"x", Some(Duration::ZERO)).unwrap();
        cache
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test_case(b"memo:geo:[\"x\"]", "memo:geo:[\"x\"]")]
    #[test_case(&[0xff, 0x00], "hex:ff00")]
    #[test_case(b"a\nb", "hex:610a62")]
    #[test_case(b"hex:41", "hex:6865783a3431")]
    fn test_display_key(raw: &[u8], shown: &str) {
        assert_eq!(display_key(raw), shown);
        assert_eq!(decode_key(shown), raw);
    }

    #[test]
    fn test_keys_listing() {
        let cache = cache();
        let text = output(|out| keys(&cache, out));
        assert_eq!(text, "memo:geo:[\"Amsterdam\"]\nstale\nhex:ff00\n");
    }

    #[test]
    fn test_clear_one_key() {
        let mut cache = cache();
        output(|out| clear(&mut cache, Some("hex:ff00"), out));
        assert_eq!(cache.keys().len(), 2);
    }

    #[test]
    fn test_clear_unknown_key() {
        let mut cache = cache();
        let err = clear(&mut cache, Some("missing"), &mut Vec::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_clear_all() {
        let mut cache = cache();
        let text = output(|out| clear(&mut cache, None, out));
        assert_eq!(text, "Removed 3 entries\n");
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_expire_and_stats() {
        let mut cache = cache();
        let text = output(|out| stats(&cache, out));
        assert!(text.contains("Expired: 1"));
        assert!(text.contains("As of: 2024-01-01 00:00:00 UTC"));

        let text = output(|out| expire(&mut cache, out));
        assert_eq!(text, "Removed 1 expired entries\n");
        assert_eq!(cache.stats().total_entries, 2);
    }
}
