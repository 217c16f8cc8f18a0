//! Shared constants for decorum.

// ═══════════════════════════════════════════════════════════════════════════════
// MEMOIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live of a memoized result, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 600;

/// Longest key handed to an external backend verbatim.
/// Memcached rejects keys above 250 bytes; longer keys are digested.
pub const MAX_BACKEND_KEY_LEN: usize = 250;

/// Marker placed in front of digested backend keys.
pub const DIGEST_KEY_MARKER: &str = "sha3-";

// ═══════════════════════════════════════════════════════════════════════════════
// PROFILING
// ═══════════════════════════════════════════════════════════════════════════════

/// Directory profile dumps are written to unless configured otherwise.
pub const DEFAULT_PROFILE_DIR: &str = "/tmp";

/// File extension of profile dumps (`<function>.profile`).
pub const PROFILE_EXTENSION: &str = "profile";

/// Format tag stored in every profile dump.
pub const PROFILE_FORMAT: &str = "decorum-profile/1";

/// Number of report rows printed by default.
pub const DEFAULT_STATS_LIMIT: usize = 50;

/// Sort key used by reports when none is given.
pub const DEFAULT_SORT_KEY: &str = "cumulative";

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides [`DEFAULT_TTL_SECONDS`].
pub const ENV_CACHE_TTL: &str = "DECORUM_CACHE_TTL";

/// Key prefix applied by memoizers built from config.
pub const ENV_KEY_PREFIX: &str = "DECORUM_KEY_PREFIX";

/// Overrides [`DEFAULT_PROFILE_DIR`].
pub const ENV_PROFILE_DIR: &str = "DECORUM_PROFILE_DIR";
