//! Timed memoization of function calls.
//!
//! ```rust
//! use std::time::Duration;
//! use decorum_cache::MemoCache;
//! use decorum_core::DecorumError;
//!
//! let cache = MemoCache::new();
//! let square = cache
//!     .memoize(Duration::from_secs(100), None)
//!     .wrap("square", |args: &(i64,)| Ok::<_, DecorumError>(args.0 * args.0));
//!
//! assert_eq!(square.call(&(4,)).unwrap(), 16);
//! assert_eq!(square.call(&(4,)).unwrap(), 16); // served from the table
//! ```

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use decorum_core::config::DecorumConfig;
use decorum_core::constants::DEFAULT_TTL_SECONDS;
use decorum_core::error::{DecorumError, Result};
use decorum_core::key::KeyDefaults;
use decorum_core::traits::{CacheBackend, Clock, SystemClock};
use decorum_core::value::{IntoCallArgs, ToArg};

use crate::store::{BackendStore, LocalStore, MemoSlot, ResultStore, SharedStore, SlotStats, SweepSlot};

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

struct CacheInner {
    slots: DashMap<u64, Weak<dyn SweepSlot>>,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
    backend: Option<Arc<dyn CacheBackend>>,
    fallback_logged: AtomicBool,
}

/// Owner of the memo table: one slot per wrapped function.
///
/// Cheap to clone; clones share the same table. Slots live as long as the
/// function wrapped into them. Expired entries are only dropped lazily on
/// access or by an explicit [`MemoCache::collect`].
#[derive(Clone)]
pub struct MemoCache {
    inner: Arc<CacheInner>,
}

impl MemoCache {
    /// Creates an empty in-process cache.
    pub fn new() -> Self {
        Self::build(Arc::new(SystemClock), None)
    }

    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, None)
    }

    /// Creates a cache whose shared wrappers store results in `backend`.
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self::build(Arc::new(SystemClock), Some(backend))
    }

    /// Creates a cache with both a backend and a custom clock.
    pub fn with_backend_and_clock(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, Some(backend))
    }

    fn build(clock: Arc<dyn Clock>, backend: Option<Arc<dyn CacheBackend>>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: DashMap::new(),
                next_id: AtomicU64::new(1),
                clock,
                backend,
                fallback_logged: AtomicBool::new(false),
            }),
        }
    }

    /// Returns a memoizer whose results stay valid for `ttl`.
    ///
    /// `key_prefix`, when set, is prepended to every key the memoizer builds.
    pub fn memoize(&self, ttl: Duration, key_prefix: Option<&str>) -> Memoizer {
        Memoizer {
            cache: self.clone(),
            ttl,
            key_prefix: key_prefix.map(str::to_owned),
            defaults: None,
        }
    }

    /// Returns a memoizer using the TTL and key prefix from `config`.
    pub fn memoize_with_config(&self, config: &DecorumConfig) -> Memoizer {
        self.memoize(config.default_ttl(), config.key_prefix.as_deref())
    }

    /// Returns true if shared wrappers defer to an external backend.
    pub fn has_backend(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Drops every expired entry of every live slot.
    ///
    /// Works on a snapshot of the registered slots, so functions wrapped or
    /// dropped during the sweep are fine. Entries being computed are skipped.
    /// Returns the number of entries removed.
    #[instrument(skip(self))]
    pub fn collect(&self) -> usize {
        let live: Vec<Arc<dyn SweepSlot>> = self
            .inner
            .slots
            .iter()
            .filter_map(|slot| slot.value().upgrade())
            .collect();
        self.inner.slots.retain(|_, slot| slot.strong_count() > 0);

        let removed: usize = live.iter().map(|slot| slot.collect()).sum();
        debug!(slots = live.len(), removed, "Collected expired memo entries");
        removed
    }

    /// Entry counts of every live slot, ordered by registration.
    pub fn stats(&self) -> Vec<SlotStats> {
        let mut live: Vec<(u64, Arc<dyn SweepSlot>)> = self
            .inner
            .slots
            .iter()
            .filter_map(|slot| slot.value().upgrade().map(|s| (*slot.key(), s)))
            .collect();
        live.sort_by_key(|(id, _)| *id);
        live.into_iter().map(|(_, slot)| slot.stats()).collect()
    }

    /// Forgets every cached result of every slot.
    pub fn clear(&self) {
        let live: Vec<Arc<dyn SweepSlot>> = self
            .inner
            .slots
            .iter()
            .filter_map(|slot| slot.value().upgrade())
            .collect();
        for slot in live {
            slot.clear();
        }
    }

    fn register<R: Send + Sync + 'static>(&self, name: &str, ttl: Duration, prefix: Option<String>) -> LocalStore<R> {
        let slot = Arc::new(MemoSlot::<R>::new(name.to_owned(), ttl, prefix, self.inner.clock.clone()));
        let weak: Weak<dyn SweepSlot> = Arc::downgrade(&slot) as Weak<dyn SweepSlot>;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.slots.insert(id, weak);
        debug!(function = name, id, ttl_secs = ttl.as_secs_f64(), "Registered memo slot");
        LocalStore::new(slot)
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a memoizer on a private, fresh [`MemoCache`].
///
/// Convenient for one-off use; functions wrapped this way can only be swept
/// through their own [`Memoized::collect`].
pub fn memoize(ttl_seconds: u64, key_prefix: Option<&str>) -> Memoizer {
    MemoCache::new().memoize(Duration::from_secs(ttl_seconds), key_prefix)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMOIZER
// ═══════════════════════════════════════════════════════════════════════════════

/// A configured memoization policy, ready to wrap functions.
#[derive(Clone)]
pub struct Memoizer {
    cache: MemoCache,
    ttl: Duration,
    key_prefix: Option<String>,
    defaults: Option<KeyDefaults>,
}

impl Memoizer {
    /// The time-to-live of results.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The key prefix, if any.
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Drops `None` keyword arguments from keys before encoding.
    pub fn normalize_defaults(mut self) -> Self {
        self.defaults.get_or_insert_with(KeyDefaults::new);
        self
    }

    /// Declares a keyword default; a call passing exactly this value shares
    /// the entry of a call omitting it. Enables default normalization.
    pub fn default_kwarg(mut self, name: impl Into<String>, value: impl ToArg) -> Result<Self> {
        self.defaults.get_or_insert_with(KeyDefaults::new).declare(name, value)?;
        Ok(self)
    }

    /// Wraps `f`, keeping its results in the in-process memo table.
    pub fn wrap<A, R, E, F>(&self, name: impl Into<String>, f: F) -> Memoized<A, R, F, LocalStore<R>>
    where
        F: Fn(&A) -> std::result::Result<R, E>,
        R: Clone + Send + Sync + 'static,
    {
        let name = name.into();
        let store = self.cache.register(&name, self.ttl, self.key_prefix.clone());
        Memoized::new(name, store, self.defaults.clone(), f)
    }

    /// Wraps `f`, keeping its results in the cache's external backend.
    ///
    /// Backend entries are namespaced by `name` and the key prefix only, so
    /// every function wrapped under the same name (in this process or any
    /// other sharing the backend) reads and writes the same entries. Use
    /// distinct names, or distinct prefixes, for functions whose results
    /// differ; a stored value of another type surfaces as
    /// [`DecorumError::CorruptEntry`].
    ///
    /// Falls back to the in-process memo table when the cache was built
    /// without a backend. There, as with [`wrap`](Memoizer::wrap), each
    /// wrapped function has its own slot.
    pub fn wrap_shared<A, R, E, F>(&self, name: impl Into<String>, f: F) -> Memoized<A, R, F, SharedStore<R>>
    where
        F: Fn(&A) -> std::result::Result<R, E>,
        R: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let name = name.into();
        let store = match &self.cache.inner.backend {
            Some(backend) => SharedStore::Backend(BackendStore::new(
                name.clone(),
                self.ttl,
                self.key_prefix.clone(),
                backend.clone(),
            )),
            None => {
                if !self.cache.inner.fallback_logged.swap(true, Ordering::Relaxed) {
                    info!("No cache backend configured, defaulting to in-process memoization");
                }
                SharedStore::Local(self.cache.register(&name, self.ttl, self.key_prefix.clone()))
            }
        };
        Memoized::new(name, store, self.defaults.clone(), f)
    }
}

impl Default for Memoizer {
    fn default() -> Self {
        memoize(DEFAULT_TTL_SECONDS, None)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMOIZED FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// A memoized function.
///
/// Calling it with arguments whose key holds a valid result returns that
/// result without invoking the function. Otherwise the function runs; an
/// `Ok` result is cached, an `Err` is returned untouched and not cached.
pub struct Memoized<A, R, F, S> {
    name: String,
    store: S,
    defaults: Option<KeyDefaults>,
    f: F,
    _call: PhantomData<fn(&A) -> R>,
}

impl<A, R, F, S> Memoized<A, R, F, S> {
    fn new(name: String, store: S, defaults: Option<KeyDefaults>, f: F) -> Self {
        Self {
            name,
            store,
            defaults,
            f,
            _call: PhantomData,
        }
    }

    /// Name the function was wrapped under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Calls the function through the cache.
    pub fn call<E>(&self, args: &A) -> std::result::Result<R, E>
    where
        A: IntoCallArgs,
        F: Fn(&A) -> std::result::Result<R, E>,
        S: ResultStore<R>,
        E: From<DecorumError>,
    {
        let record = args.to_call_args();
        let record = match &self.defaults {
            Some(defaults) => defaults.normalize(&record),
            None => record,
        };
        self.store.get_or_compute(&record, || (self.f)(args))
    }

    /// Calls the wrapped function directly, bypassing the cache.
    pub fn call_uncached<E>(&self, args: &A) -> std::result::Result<R, E>
    where
        F: Fn(&A) -> std::result::Result<R, E>,
    {
        (self.f)(args)
    }
}

impl<A, R: Send + Sync, F> Memoized<A, R, F, LocalStore<R>> {
    /// Number of stored results, expired ones included. Entries locked by a
    /// call in progress, such as one still computing, are not counted.
    pub fn len(&self) -> usize {
        self.store.stats().total_entries
    }

    /// Returns true if no result is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops this function's expired entries.
    pub fn collect(&self) -> usize {
        self.store.collect()
    }

    /// Forgets every cached result of this function.
    pub fn clear(&self) {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    use decorum_core::traits::ManualClock;
    use decorum_core::value::CallArgs;
    use test_case::test_case;

    use crate::backend::MemoryBackend;

    type TestResult<T> = std::result::Result<T, DecorumError>;

    #[test]
    fn test_hit_avoids_recomputation() {
        let calls = AtomicUsize::new(0);
        let cache = MemoCache::new();
        let double = cache.memoize(Duration::from_secs(100), None).wrap("double", |args: &(i32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0 * 2)
        });

        assert_eq!(double.call(&(21,)).unwrap(), 42);
        assert_eq!(double.call(&(21,)).unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_ttl_forces_recomputation() {
        let calls = AtomicUsize::new(0);
        let double = memoize(0, None).wrap("double", |args: &(i32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0 * 2)
        });

        double.call(&(1,)).unwrap();
        double.call(&(1,)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expiry_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let calls = AtomicUsize::new(0);
        let cache = MemoCache::with_clock(clock.clone());
        let f = cache.memoize(Duration::from_secs(10), None).wrap("f", |_: &()| {
            TestResult::Ok(calls.fetch_add(1, Ordering::SeqCst))
        });

        assert_eq!(f.call(&()).unwrap(), 0);
        clock.advance(Duration::from_secs(10));
        assert_eq!(f.call(&()).unwrap(), 0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(f.call(&()).unwrap(), 1);
    }

    #[test]
    fn test_kwarg_order_shares_entry() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("f", |args: &CallArgs| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.keyword().len())
        });

        f.call(&CallArgs::new().kwarg("a", 1).kwarg("b", 2)).unwrap();
        f.call(&CallArgs::new().kwarg("b", 2).kwarg("a", 1)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_distinct_arguments_distinct_entries() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("f", |args: &(u8,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0)
        });

        assert_eq!(f.call(&(1,)).unwrap(), 1);
        assert_eq!(f.call(&(2,)).unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn test_error_is_not_cached() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("flaky", |_: &(i32,)| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(DecorumError::InternalError("first call fails".into()))
            } else {
                Ok(n)
            }
        });

        assert!(matches!(f.call(&(1,)), Err(DecorumError::InternalError(_))));
        assert_eq!(f.call(&(1,)).unwrap(), 1);
        assert_eq!(f.call(&(1,)).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_wrapped_error_type_is_preserved() {
        #[derive(Debug, PartialEq)]
        enum AppError {
            NotFound,
            Cache(String),
        }
        impl From<DecorumError> for AppError {
            fn from(e: DecorumError) -> Self {
                AppError::Cache(e.to_string())
            }
        }

        let f = memoize(100, None).wrap("lookup", |_: &(f64,)| Err::<u8, _>(AppError::NotFound));
        assert_eq!(f.call(&(1.0,)), Err(AppError::NotFound));
        assert!(matches!(f.call(&(f64::NAN,)), Err(AppError::Cache(_))));
    }

    #[test]
    fn test_unencodable_argument_skips_call() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("f", |_: &(f64,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(())
        });

        let err = f.call(&(f64::NAN,)).unwrap_err();
        assert!(err.is_encoding_error());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_collect_removes_only_stale() {
        let clock = Arc::new(ManualClock::new());
        let cache = MemoCache::with_clock(clock.clone());
        let calls = AtomicUsize::new(0);
        let f = cache.memoize(Duration::from_secs(10), None).wrap("f", |args: &(i32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0)
        });

        f.call(&(1,)).unwrap();
        clock.advance(Duration::from_secs(11));
        f.call(&(2,)).unwrap();
        assert_eq!(f.len(), 2);

        assert_eq!(cache.collect(), 1);
        assert_eq!(f.len(), 1);

        // The fresh entry is still a hit.
        f.call(&(2,)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_collect_uses_each_functions_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = MemoCache::with_clock(clock.clone());
        let short = cache.memoize(Duration::from_secs(5), None).wrap("short", |_: &()| TestResult::Ok(1));
        let long = cache.memoize(Duration::from_secs(60), None).wrap("long", |_: &()| TestResult::Ok(2));

        short.call(&()).unwrap();
        long.call(&()).unwrap();
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.collect(), 1);
        let stats = cache.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "short");
        assert_eq!(stats[0].total_entries, 0);
        assert_eq!(stats[1].name, "long");
        assert_eq!(stats[1].valid_entries, 1);
    }

    #[test]
    fn test_dropped_functions_leave_registry() {
        let cache = MemoCache::new();
        {
            let f = cache.memoize(Duration::from_secs(5), None).wrap("temp", |_: &()| TestResult::Ok(1));
            f.call(&()).unwrap();
            assert_eq!(cache.stats().len(), 1);
        }
        assert_eq!(cache.collect(), 0);
        assert!(cache.stats().is_empty());
    }

    #[test]
    fn test_separately_wrapped_functions_do_not_share() {
        let cache = MemoCache::new();
        let memo = cache.memoize(Duration::from_secs(100), None);
        let one = memo.wrap("f", |_: &()| TestResult::Ok(1));
        let two = memo.wrap("f", |_: &()| TestResult::Ok(2));

        assert_eq!(one.call(&()).unwrap(), 1);
        assert_eq!(two.call(&()).unwrap(), 2);
    }

    #[test]
    fn test_len_skips_entry_being_computed() {
        let cache = MemoCache::new();
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let f = cache.memoize(Duration::from_secs(100), None).wrap("f", {
            let cache = cache.clone();
            let seen = seen.clone();
            move |args: &(i32,)| {
                if args.0 == 2 {
                    seen.store(cache.stats()[0].total_entries, Ordering::SeqCst);
                }
                TestResult::Ok(args.0)
            }
        });

        f.call(&(1,)).unwrap();
        f.call(&(2,)).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = MemoCache::new();
        let f = cache.memoize(Duration::from_secs(100), None).wrap("f", |a: &(i32,)| TestResult::Ok(a.0));
        f.call(&(1,)).unwrap();
        f.call(&(2,)).unwrap();

        cache.clear();
        assert!(f.is_empty());
    }

    #[test]
    fn test_default_kwargs_share_entry() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None)
            .default_kwarg("spam", 10)
            .unwrap()
            .wrap("f", |args: &CallArgs| {
                calls.fetch_add(1, Ordering::SeqCst);
                TestResult::Ok(args.positional().len())
            });

        f.call(&CallArgs::new().arg("x")).unwrap();
        f.call(&CallArgs::new().arg("x").kwarg("spam", 10)).unwrap();
        f.call(&CallArgs::new().arg("x").kwarg("eggs", None::<u8>)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        f.call(&CallArgs::new().arg("x").kwarg("spam", 11)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_same_key_computes_once() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("slow", |args: &(u32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            TestResult::Ok(args.0 + 1)
        });
        let barrier = Barrier::new(8);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    assert_eq!(f.call(&(41,)).unwrap(), 42);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        let calls = AtomicUsize::new(0);
        let f = memoize(100, None).wrap("f", |args: &(u32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0)
        });

        std::thread::scope(|s| {
            for i in 0..8u32 {
                let f = &f;
                s.spawn(move || {
                    for _ in 0..10 {
                        assert_eq!(f.call(&(i,)).unwrap(), i);
                    }
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(f.len(), 8);
    }

    #[test]
    fn test_collect_during_calls_keeps_fresh_results() {
        let calls = AtomicUsize::new(0);
        let cache = MemoCache::new();
        let f = cache.memoize(Duration::from_secs(100), None).wrap("f", |args: &(u32,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(args.0)
        });
        let done = AtomicBool::new(false);
        let keys = 200u32;

        std::thread::scope(|s| {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    cache.collect();
                }
            });

            let callers: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        for round in 0..3 {
                            for k in 0..keys {
                                assert_eq!(f.call(&(k,)).unwrap(), k, "round {round}");
                            }
                        }
                    })
                })
                .collect();
            for caller in callers {
                caller.join().unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        // Nothing expires, so every key is computed exactly once.
        assert_eq!(calls.load(Ordering::SeqCst), keys as usize);
        assert_eq!(f.len(), keys as usize);
    }

    #[test]
    fn test_shared_uses_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = MemoCache::with_backend(backend.clone());
        let calls = AtomicUsize::new(0);
        let f = cache
            .memoize(Duration::from_secs(100), Some("app:"))
            .wrap_shared("square", |args: &(i64,)| {
                calls.fetch_add(1, Ordering::SeqCst);
                TestResult::Ok(args.0 * args.0)
            });

        assert!(f.store().is_backend());
        assert_eq!(f.call(&(3,)).unwrap(), 9);
        assert_eq!(f.call(&(3,)).unwrap(), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.keys(), vec!["app:square:(3){}".to_string()]);
    }

    #[test]
    fn test_shared_backend_expiry_and_errors() {
        let clock = Arc::new(ManualClock::new());
        let backend = Arc::new(MemoryBackend::with_config_and_clock(Default::default(), clock.clone()));
        let cache = MemoCache::with_backend_and_clock(backend, clock.clone());
        let calls = AtomicUsize::new(0);
        let f = cache.memoize(Duration::from_secs(10), None).wrap_shared("f", |_: &()| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(DecorumError::InternalError("boom".into()))
            } else {
                Ok(format!("v{n}"))
            }
        });

        assert!(f.call(&()).is_err());
        assert_eq!(f.call(&()).unwrap(), "v1");
        assert_eq!(f.call(&()).unwrap(), "v1");
        clock.advance(Duration::from_secs(11));
        assert_eq!(f.call(&()).unwrap(), "v2");
    }

    #[test]
    fn test_shared_entries_are_namespaced_by_name() {
        let cache = MemoCache::with_backend(Arc::new(MemoryBackend::new()));
        let memo = cache.memoize(Duration::from_secs(100), None);
        let first = memo.wrap_shared("f", |_: &()| TestResult::Ok(1u32));
        let same_name = memo.wrap_shared("f", |_: &()| TestResult::Ok(2u32));
        let other_name = memo.wrap_shared("g", |_: &()| TestResult::Ok(3u32));

        assert_eq!(first.call(&()).unwrap(), 1);
        assert_eq!(same_name.call(&()).unwrap(), 1);
        assert_eq!(other_name.call(&()).unwrap(), 3);

        let mismatched = memo.wrap_shared("f", |_: &()| TestResult::Ok("text".to_string()));
        assert!(matches!(mismatched.call(&()), Err(DecorumError::CorruptEntry { .. })));
    }

    #[test]
    fn test_shared_falls_back_to_local() {
        let cache = MemoCache::new();
        let f = cache.memoize(Duration::from_secs(100), None).wrap_shared("f", |a: &(i32,)| TestResult::Ok(a.0));

        assert!(!f.store().is_backend());
        f.call(&(1,)).unwrap();
        assert_eq!(cache.stats()[0].valid_entries, 1);
    }

    #[test_case(0, 2 ; "zero ttl expires immediately")]
    #[test_case(1, 1 ; "short ttl still valid")]
    #[test_case(600, 1 ; "default ttl")]
    fn test_ttl_table(ttl_secs: u64, expected_calls: usize) {
        let calls = AtomicUsize::new(0);
        let f = memoize(ttl_secs, None).wrap("f", |_: &()| {
            calls.fetch_add(1, Ordering::SeqCst);
            TestResult::Ok(())
        });
        f.call(&()).unwrap();
        f.call(&()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
    }

    #[test]
    fn test_default_memoizer() {
        let memo = Memoizer::default();
        assert_eq!(memo.ttl(), Duration::from_secs(600));
        assert!(memo.key_prefix().is_none());

        let config = DecorumConfig {
            default_ttl_seconds: 30,
            key_prefix: Some("cfg:".into()),
            ..DecorumConfig::default()
        };
        let memo = MemoCache::new().memoize_with_config(&config);
        assert_eq!(memo.ttl(), Duration::from_secs(30));
        assert_eq!(memo.key_prefix(), Some("cfg:"));
    }
}
