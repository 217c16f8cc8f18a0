//! Common traits for decorum.
//!
//! These traits are the seams between the wrappers and their collaborators,
//! so that storage and time can be swapped out in production and in tests.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE BACKEND TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for an external key/value cache.
///
/// Implementations might use:
/// - An in-process map (see `decorum_cache::MemoryBackend`)
/// - Redis or Memcached
/// - A shared database table
///
/// Values are JSON documents so any backend can store them as text.
pub trait CacheBackend: Send + Sync {
    /// Returns true if a live value is stored under `key`.
    fn contains(&self, key: &str) -> Result<bool>;

    /// Returns the value stored under `key`, if any and not expired.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Stores `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Monotonic time source used for expiry decisions.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Lets tests age cache entries without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}
