//! In-memory TTL backend.
//!
//! An in-process implementation of [`CacheBackend`], for single-process
//! deployments and for exercising the external-backend path in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use decorum_core::error::Result;
use decorum_core::traits::{CacheBackend, Clock, SystemClock};

/// Backend entry with TTL.
#[derive(Clone)]
struct BackendEntry {
    value: serde_json::Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl BackendEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl.is_zero() || now.saturating_duration_since(self.inserted_at) > self.ttl
    }
}

/// Backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Whether to drop expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            auto_cleanup: true,
        }
    }
}

/// In-memory key/value store with per-entry TTL.
///
/// Thread-safe. When full, expired entries are dropped first and then the
/// oldest entry is evicted.
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, BackendEntry>>,
    config: BackendConfig,
    clock: Arc<dyn Clock>,
}

impl MemoryBackend {
    /// Creates a backend with default configuration.
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    /// Creates a backend with custom configuration.
    pub fn with_config(config: BackendConfig) -> Self {
        Self::with_config_and_clock(config, Arc::new(SystemClock))
    }

    /// Creates a backend that reads time from `clock`.
    pub fn with_config_and_clock(config: BackendConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Removes an entry.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        let now = self.clock.now();
        self.entries.write().retain(|_, e| !e.is_expired(now));
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the stored keys, expired ones included.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns backend statistics.
    pub fn stats(&self) -> BackendStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        BackendStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryBackend {
    fn contains(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now)))
    }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let now = self.clock.now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        let now = self.clock.now();
        let mut entries = self.entries.write();

        if !entries.contains_key(key) {
            if self.config.auto_cleanup && entries.len() >= self.config.max_entries {
                entries.retain(|_, e| !e.is_expired(now));
            }
            if entries.len() >= self.config.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest_key);
                }
            }
        }

        entries.insert(
            key.to_owned(),
            BackendEntry {
                value,
                inserted_at: now,
                ttl,
            },
        );
        Ok(())
    }
}

/// Backend statistics.
#[derive(Clone, Debug)]
pub struct BackendStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
}
