//! Result stores behind a memoized function.
//!
//! A store answers one question: given a call record, return the cached
//! result or compute, remember and return a fresh one. Two stores exist:
//!
//! - [`LocalStore`]: the in-process memo table, one slot per wrapped function
//! - [`BackendStore`]: defers to an external [`CacheBackend`]
//!
//! [`SharedStore`] picks one of them at wrap time.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha3::{Digest, Sha3_256};
use tracing::trace;

use decorum_core::constants::{DIGEST_KEY_MARKER, MAX_BACKEND_KEY_LEN};
use decorum_core::error::DecorumError;
use decorum_core::key::CacheKey;
use decorum_core::traits::{CacheBackend, Clock};
use decorum_core::value::CallArgs;

/// Something that can serve memoized results of type `R`.
pub trait ResultStore<R> {
    /// Returns the cached result for `args`, or runs `compute` and caches
    /// its `Ok` value. An `Err` from `compute` is returned as is and nothing
    /// is cached.
    fn get_or_compute<E, C>(&self, args: &CallArgs, compute: C) -> Result<R, E>
    where
        C: FnOnce() -> Result<R, E>,
        E: From<DecorumError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-PROCESS MEMO TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// A computed result and when it was computed.
struct Entry<R> {
    value: R,
    computed_at: Instant,
}

impl<R> Entry<R> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        ttl.is_zero() || now.saturating_duration_since(self.computed_at) > ttl
    }
}

/// A key's cell. Locked for the whole lookup-or-compute-and-store sequence.
type Cell<R> = Arc<Mutex<Option<Entry<R>>>>;

/// Entry counts of one memoized function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotStats {
    /// Name the function was wrapped under
    pub name: String,
    /// Configured time-to-live
    pub ttl: Duration,
    /// Stored results (including expired), skipping entries locked by a
    /// call in progress
    pub total_entries: usize,
    /// Results past their TTL
    pub expired_entries: usize,
    /// Results still served as hits
    pub valid_entries: usize,
}

/// The memo table slot of one wrapped function.
pub(crate) struct MemoSlot<R> {
    name: String,
    ttl: Duration,
    prefix: Option<String>,
    clock: Arc<dyn Clock>,
    cells: DashMap<CacheKey, Cell<R>>,
}

impl<R> MemoSlot<R> {
    pub(crate) fn new(name: String, ttl: Duration, prefix: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            prefix,
            clock,
            cells: DashMap::new(),
        }
    }
}

/// Operations the owning cache runs over every slot, whatever its result type.
pub(crate) trait SweepSlot: Send + Sync {
    /// Drops expired entries, returning how many were removed.
    fn collect(&self) -> usize;
    fn stats(&self) -> SlotStats;
    fn clear(&self);
}

impl<R: Send + Sync> SweepSlot for MemoSlot<R> {
    fn collect(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        // Cells locked by an in-flight computation are left alone.
        self.cells.retain(|_, cell| match cell.try_lock() {
            Some(guard) => {
                let keep = guard.as_ref().is_some_and(|e| !e.is_expired(now, self.ttl));
                if !keep && guard.is_some() {
                    removed += 1;
                }
                keep
            }
            None => true,
        });
        removed
    }

    fn stats(&self) -> SlotStats {
        let now = self.clock.now();
        let (mut valid, mut expired) = (0, 0);
        for cell in self.cells.iter() {
            if let Some(guard) = cell.value().try_lock() {
                match guard.as_ref() {
                    Some(e) if e.is_expired(now, self.ttl) => expired += 1,
                    Some(_) => valid += 1,
                    None => {}
                }
            }
        }
        SlotStats {
            name: self.name.clone(),
            ttl: self.ttl,
            total_entries: valid + expired,
            expired_entries: expired,
            valid_entries: valid,
        }
    }

    fn clear(&self) {
        self.cells.clear();
    }
}

/// In-process store: the wrapped function's slot of the memo table.
///
/// Every key has its own lock, held across lookup, computation and store.
/// Calls with different keys run in parallel; concurrent calls with the same
/// key compute once and share the result.
pub struct LocalStore<R> {
    slot: Arc<MemoSlot<R>>,
}

impl<R> LocalStore<R> {
    pub(crate) fn new(slot: Arc<MemoSlot<R>>) -> Self {
        Self { slot }
    }
}

impl<R: Send + Sync> LocalStore<R> {
    /// Entry counts of this slot.
    pub fn stats(&self) -> SlotStats {
        self.slot.stats()
    }

    /// Drops this slot's expired entries.
    pub fn collect(&self) -> usize {
        self.slot.collect()
    }

    /// Forgets every cached result.
    pub fn clear(&self) {
        self.slot.clear()
    }
}

impl<R: Clone> ResultStore<R> for LocalStore<R> {
    fn get_or_compute<E, C>(&self, args: &CallArgs, compute: C) -> Result<R, E>
    where
        C: FnOnce() -> Result<R, E>,
        E: From<DecorumError>,
    {
        let slot = &self.slot;
        let key = CacheKey::encode(args, slot.prefix.as_deref())?;
        loop {
            let cell: Cell<R> = slot.cells.entry(key.clone()).or_default().value().clone();
            let mut guard = cell.lock();

            // A sweep may have dropped the cell before it was locked.
            let current = slot
                .cells
                .get(&key)
                .is_some_and(|c| Arc::ptr_eq(c.value(), &cell));
            if !current {
                continue;
            }

            if let Some(entry) = guard.as_ref() {
                if !entry.is_expired(slot.clock.now(), slot.ttl) {
                    trace!(function = %slot.name, %key, "memo hit");
                    return Ok(entry.value.clone());
                }
            }

            trace!(function = %slot.name, %key, "memo miss");
            *guard = None;
            let value = compute()?;
            *guard = Some(Entry {
                value: value.clone(),
                computed_at: slot.clock.now(),
            });
            return Ok(value);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTERNAL BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds the key handed to a backend: `<prefix><function>:<call key>`.
///
/// The function part is the name given at wrap time; functions sharing a
/// name share entries.
///
/// Keys that are too long, or that hold characters memcached refuses
/// (non-ASCII, whitespace, control characters), are replaced by
/// `<prefix><function>:sha3-<hex digest of the full key>`.
pub fn backend_key(prefix: Option<&str>, function: &str, key: &CacheKey) -> String {
    let prefix = prefix.unwrap_or("");
    let full = format!("{prefix}{function}:{key}");

    let storable = full.len() <= MAX_BACKEND_KEY_LEN && full.bytes().all(|b| b.is_ascii_graphic());
    if storable {
        full
    } else {
        let digest = Sha3_256::digest(full.as_bytes());
        format!("{prefix}{function}:{DIGEST_KEY_MARKER}{}", hex::encode(digest))
    }
}

/// Store that keeps results in an external [`CacheBackend`].
///
/// Results travel as JSON. Lookup-or-compute is serialized per wrapped
/// function, so one function never computes the same key twice at once.
pub struct BackendStore<R> {
    name: String,
    ttl: Duration,
    prefix: Option<String>,
    backend: Arc<dyn CacheBackend>,
    lock: Mutex<()>,
    _result: PhantomData<fn() -> R>,
}

impl<R> BackendStore<R> {
    pub(crate) fn new(name: String, ttl: Duration, prefix: Option<String>, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            name,
            ttl,
            prefix,
            backend,
            lock: Mutex::new(()),
            _result: PhantomData,
        }
    }
}

impl<R: Serialize + DeserializeOwned> ResultStore<R> for BackendStore<R> {
    fn get_or_compute<E, C>(&self, args: &CallArgs, compute: C) -> Result<R, E>
    where
        C: FnOnce() -> Result<R, E>,
        E: From<DecorumError>,
    {
        let key = CacheKey::encode(args, None)?;
        let key = backend_key(self.prefix.as_deref(), &self.name, &key);

        let _guard = self.lock.lock();
        if self.backend.contains(&key)? {
            if let Some(stored) = self.backend.get(&key)? {
                trace!(function = %self.name, %key, "backend hit");
                return serde_json::from_value(stored).map_err(|e| {
                    DecorumError::CorruptEntry {
                        key: key.clone(),
                        reason: e.to_string(),
                    }
                    .into()
                });
            }
        }

        trace!(function = %self.name, %key, "backend miss");
        let value = compute()?;
        let encoded = serde_json::to_value(&value).map_err(DecorumError::from)?;
        self.backend.set(&key, encoded, self.ttl)?;
        Ok(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EITHER
// ═══════════════════════════════════════════════════════════════════════════════

/// Backend store when the cache has a backend, in-process table otherwise.
pub enum SharedStore<R> {
    /// No backend configured; results stay in process.
    Local(LocalStore<R>),
    /// Results live in the external backend.
    Backend(BackendStore<R>),
}

impl<R> SharedStore<R> {
    /// Returns true if results go to an external backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, SharedStore::Backend(_))
    }
}

impl<R: Clone + Serialize + DeserializeOwned> ResultStore<R> for SharedStore<R> {
    fn get_or_compute<E, C>(&self, args: &CallArgs, compute: C) -> Result<R, E>
    where
        C: FnOnce() -> Result<R, E>,
        E: From<DecorumError>,
    {
        match self {
            SharedStore::Local(store) => store.get_or_compute(args, compute),
            SharedStore::Backend(store) => store.get_or_compute(args, compute),
        }
    }
}
