//! Argument / return-value logging.
//!
//! ```text
//! [FUN] foo [ARG] bar: "a", spam: "first star", something: "boo" *("second star")
//! [FUN] foo [RET] None
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use tracing::debug;

use decorum_core::value::{CallArgs, IntoCallArgs};

use crate::signature::{join_values, Signature};

/// Renders the `[ARG]` line for a call.
///
/// Positionally bound parameters come first, then every keyword argument in
/// name order, then surplus positional values as `*(...)`.
pub fn format_arguments(signature: &Signature, args: &CallArgs) -> String {
    let bound = signature.bind(args);

    let named: Vec<String> = bound
        .by_position
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .chain(args.keyword().iter().map(|(name, value)| format!("{name}: {value}")))
        .collect();

    let name = signature.name();
    match (named.is_empty(), bound.extra_positional.is_empty()) {
        (true, true) => format!("[FUN] {name} [ARG] No arguments"),
        (false, true) => format!("[FUN] {name} [ARG] {}", named.join(", ")),
        (true, false) => format!("[FUN] {name} [ARG] *({})", join_values(&bound.extra_positional)),
        (false, false) => format!(
            "[FUN] {name} [ARG] {} *({})",
            named.join(", "),
            join_values(&bound.extra_positional)
        ),
    }
}

/// Renders the `[RET]` line for a returned value.
pub fn format_return(signature: &Signature, value: &impl Debug) -> String {
    format!("[FUN] {} [RET] {:?}", signature.name(), value)
}

/// A function whose arguments and return values are logged at `debug`.
pub struct LoggedIo<A, F> {
    signature: Signature,
    f: F,
    _args: PhantomData<fn(&A)>,
}

/// Wraps `f` so each call logs its arguments and its return value.
///
/// Errors are returned untouched and not logged.
pub fn log_function_io<A, R, E, F>(signature: Signature, f: F) -> LoggedIo<A, F>
where
    F: Fn(&A) -> Result<R, E>,
{
    LoggedIo {
        signature,
        f,
        _args: PhantomData,
    }
}

impl<A, F> LoggedIo<A, F> {
    /// The declared signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Calls the function, logging its arguments and return value.
    pub fn call<R, E>(&self, args: &A) -> Result<R, E>
    where
        A: IntoCallArgs,
        F: Fn(&A) -> Result<R, E>,
        R: Debug,
    {
        let record = args.to_call_args();
        debug!(function = self.signature.name(), "{}", format_arguments(&self.signature, &record));

        let value = (self.f)(args)?;

        debug!(function = self.signature.name(), "{}", format_return(&self.signature, &value));
        Ok(value)
    }
}
