//! Constants shared across the atlas crates.

// ═══════════════════════════════════════════════════════════════════════════════
// LOCAL STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Directory name under `~/.config` holding local state.
///
/// Kept identical to the long-standing tool name so existing cache files are found.
pub const TOOL_NAME: &str = "ripe-atlas-tools";

/// File name of the local cache store.
pub const CACHE_FILE_NAME: &str = "cache.db";

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE LIFETIMES
// ═══════════════════════════════════════════════════════════════════════════════

/// One hour, in seconds.
pub const ONE_HOUR_SECS: u64 = 60 * 60;

/// One day, in seconds.
pub const ONE_DAY_SECS: u64 = 24 * ONE_HOUR_SECS;

/// How long a geocoded location is remembered.
pub const GEOCODE_TTL_SECS: u64 = 7 * ONE_DAY_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
// MEASUREMENT PLATFORM
// ═══════════════════════════════════════════════════════════════════════════════

/// Default base URL of the measurement platform.
pub const DEFAULT_API_URL: &str = "https://atlas.ripe.net";

/// Default geocoding endpoint.
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Page size requested when listing probes.
pub const PROBE_PAGE_SIZE: usize = 500;

/// Measurement types the platform accepts.
pub const MEASUREMENT_KINDS: [&str; 6] = ["ping", "traceroute", "dns", "sslcert", "http", "ntp"];

/// Probes listed when no `--limit` is given.
pub const DEFAULT_PROBE_LIMIT: usize = 25;

/// Probes requested for a new measurement when none is given.
pub const DEFAULT_PROBES_REQUESTED: u32 = 50;
