//! # decorum Cache
//!
//! Timed memoization of function calls.
//!
//! A [`MemoCache`] owns the memo table. [`MemoCache::memoize`] returns a
//! [`Memoizer`] for a given TTL and key prefix, and [`Memoizer::wrap`] turns a
//! function into a [`Memoized`] one whose results are cached per argument key:
//!
//! - **Hit**: a stored result younger than (or exactly) the TTL is returned
//!   and the function is not invoked
//! - **Miss**: the function runs; an `Ok` result is stored with its timestamp
//! - **Errors**: returned untouched, never cached
//!
//! Expired entries are dropped lazily, or in bulk by [`MemoCache::collect`].
//!
//! ## External backend
//!
//! [`Memoizer::wrap_shared`] stores results in a [`CacheBackend`] instead,
//! when the cache was built with one ([`MemoCache::with_backend`]);
//! [`MemoryBackend`] is an in-process implementation.
//!
//! [`CacheBackend`]: decorum_core::traits::CacheBackend

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod memo;
mod store;

pub use backend::{BackendConfig, BackendStats, MemoryBackend};
pub use memo::{memoize, MemoCache, Memoized, Memoizer};
pub use store::{backend_key, BackendStore, LocalStore, ResultStore, SharedStore, SlotStats};
