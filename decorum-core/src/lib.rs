//! # decorum Core
//!
//! Core types, errors, and traits shared by the decorum call wrappers.
//!
//! This crate provides the foundational building blocks used by all other decorum crates:
//!
//! - **Values**: [`ArgValue`] and [`CallArgs`], the explicit description of a call
//! - **Keys**: deterministic, kwarg-order independent cache key encoding
//! - **Errors**: the shared [`DecorumError`] hierarchy
//! - **Traits**: [`CacheBackend`] and [`Clock`] seams
//! - **Config**: environment-driven [`DecorumConfig`]
//!
//! ## Example
//!
//! ```rust
//! use decorum_core::{CacheKey, CallArgs};
//!
//! let a = CallArgs::new().arg(1).kwarg("a", 1).kwarg("b", 2);
//! let b = CallArgs::new().arg(1).kwarg("b", 2).kwarg("a", 1);
//! assert_eq!(CacheKey::encode(&a, None).unwrap(), CacheKey::encode(&b, None).unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod key;
pub mod traits;
pub mod value;

// Re-export commonly used items at crate root
pub use config::DecorumConfig;
pub use constants::*;
pub use error::{DecorumError, Result};
pub use key::{CacheKey, KeyDefaults};
pub use traits::*;
pub use value::{ArgValue, CallArgs, IntoCallArgs, ToArg};
