//! Domain constants shared across crates.

/// Interval between scheduled sync cycles for a property.
pub const SYNC_INTERVAL_SECS: u64 = 60;

/// Pause between sequential feed fetches inside one sync cycle, to avoid
/// bursting outbound requests against third-party calendar hosts.
pub const FEED_PAUSE_MS: u64 = 1_000;

/// Timeout for fetching a single external feed document.
pub const FEED_FETCH_TIMEOUT_SECS: u64 = 30;

/// How far ahead the calendar export looks for blocked dates.
pub const EXPORT_HORIZON_DAYS: u32 = 365;

/// Minimum-stay fallback when neither an override nor a property default is
/// set.
pub const DEFAULT_MINIMUM_STAY: u32 = 1;
