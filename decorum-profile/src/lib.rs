//! # decorum Profile
//!
//! Deterministic call profiling for marked functions.
//!
//! [`profileit`] wraps a function; each call runs inside a fresh profiling
//! session on the current thread and writes `<profile_dir>/<name>.profile`.
//! Code reached from the call marks itself with [`scope`]; outside a session
//! a scope costs one thread-local lookup and records nothing.
//!
//! [`Stats`] loads a dump back and renders a report ordered by any
//! [`SortKey`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use decorum_profile::{profileit, scope, SortKey, Stats};
//!
//! fn fib(n: u64) -> u64 {
//!     let _scope = scope("fib");
//!     if n < 2 { n } else { fib(n - 1) + fib(n - 2) }
//! }
//!
//! let profiled = profileit("fib_20", |n: &u64| Ok::<_, decorum_core::DecorumError>(fib(*n)));
//! profiled.call(&20).unwrap();
//!
//! let stats = Stats::load(profiled.dump_path()).unwrap();
//! println!("{}", stats.report(SortKey::Cumulative, 50));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dump;
mod profiler;
mod session;
mod stats;

pub use dump::{ProfileDump, ProfileEntry};
pub use profiler::{profileit, Profiled, Profiler};
pub use session::{is_active, scope, FunctionId, FunctionStats, Scope};
pub use stats::{SortKey, Stats};
