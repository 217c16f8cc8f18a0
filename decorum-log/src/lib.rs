//! # decorum Log
//!
//! Logging wrappers for function calls, emitted through `tracing`.
//!
//! Rust functions carry no runtime parameter names, so each wrapper takes a
//! [`Signature`] declaring them:
//!
//! - [`log_function_io`]: logs `[FUN] name [ARG] ...` before and
//!   `[FUN] name [RET] ...` after each call
//! - [`LogIt`] / [`log_it`]: logs `Entering name(...)` and the time spent
//!   in the function on exit
//! - [`TaggedLogger`]: prefixes free-form messages with the function tag
//!
//! ## Example
//!
//! ```rust
//! use decorum_log::{log_function_io, Signature};
//!
//! let add = log_function_io(Signature::new("add").param("a").param("b"), |args: &(i32, i32)| {
//!     Ok::<_, decorum_core::DecorumError>(args.0 + args.1)
//! });
//! assert_eq!(add.call(&(1, 2)).unwrap(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod io;
mod signature;
mod tagged;
mod timed;

pub use io::{format_arguments, format_return, log_function_io, LoggedIo};
pub use signature::{BoundCall, Param, Signature};
pub use tagged::{tag_message, TaggedLogger};
pub use timed::{format_call, format_exit, log_it, LogIt, Timed};
