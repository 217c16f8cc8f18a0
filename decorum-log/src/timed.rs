//! Entry/exit logging with time spent in the function.
//!
//! ```text
//! Entering foo(bar="a", spam=None, *(1, 2), **{"extra": true})
//! Exit foo -- Time in function: 0.42s
//! ```

use std::marker::PhantomData;
use std::time::Instant;

use tracing::debug;

use decorum_core::value::{CallArgs, IntoCallArgs};

use crate::signature::{join_values, Signature};

const DEFAULT_LOGGER: &str = "decorum";

/// Renders `name(p=v, ..., *(...), **{...})`, with declared defaults filled
/// in for omitted parameters.
pub fn format_call(signature: &Signature, args: &CallArgs) -> String {
    let bound = signature.bind(args);

    let mut parts: Vec<String> = bound
        .with_defaults()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    if !bound.extra_positional.is_empty() {
        parts.push(format!("*({})", join_values(&bound.extra_positional)));
    }
    if !bound.extra_keyword.is_empty() {
        let kw: Vec<String> = bound
            .extra_keyword
            .iter()
            .map(|(k, v)| format!("{k:?}: {v}"))
            .collect();
        parts.push(format!("**{{{}}}", kw.join(", ")));
    }

    format!("{}({})", signature.name(), parts.join(", "))
}

/// Renders the exit line.
pub fn format_exit(signature: &Signature, seconds: f64) -> String {
    format!("Exit {} -- Time in function: {:.2}s", signature.name(), seconds)
}

/// Entry/exit logging wrapper factory, optionally bound to a named logger.
#[derive(Clone, Debug, Default)]
pub struct LogIt {
    logger: Option<String>,
}

impl LogIt {
    /// Logs under the wrapped function's module, or `decorum`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs under `logger`.
    pub fn with_logger(logger: impl Into<String>) -> Self {
        Self {
            logger: Some(logger.into()),
        }
    }

    /// Wraps `f`.
    pub fn wrap<A, R, E, F>(&self, signature: Signature, f: F) -> Timed<A, F>
    where
        F: Fn(&A) -> Result<R, E>,
    {
        let logger = self
            .logger
            .clone()
            .or_else(|| signature.module().map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_LOGGER.to_owned());
        Timed {
            logger,
            signature,
            f,
            _args: PhantomData,
        }
    }
}

/// Wraps `f` with entry/exit logging on the default logger.
pub fn log_it<A, R, E, F>(signature: Signature, f: F) -> Timed<A, F>
where
    F: Fn(&A) -> Result<R, E>,
{
    LogIt::new().wrap(signature, f)
}

/// A function whose entry and exit are logged at `debug`.
pub struct Timed<A, F> {
    logger: String,
    signature: Signature,
    f: F,
    _args: PhantomData<fn(&A)>,
}

impl<A, F> Timed<A, F> {
    /// Name of the logger entries are attributed to.
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Calls the function. The exit line is only logged on success.
    pub fn call<R, E>(&self, args: &A) -> Result<R, E>
    where
        A: IntoCallArgs,
        F: Fn(&A) -> Result<R, E>,
    {
        let entry = format_call(&self.signature, &args.to_call_args());
        debug!(logger = %self.logger, "Entering {entry}");

        let start = Instant::now();
        let value = (self.f)(args)?;
        let elapsed = start.elapsed().as_secs_f64();

        debug!(logger = %self.logger, "{}", format_exit(&self.signature, elapsed));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decorum_core::value::ArgValue;
    use decorum_core::DecorumError;

    fn foo() -> Signature {
        Signature::new("foo")
            .param("bar")
            .param_with_default("spam", ArgValue::None)
            .unwrap()
    }

    #[test]
    fn test_format_call_fills_defaults() {
        let args = CallArgs::new().arg("a");
        assert_eq!(format_call(&foo(), &args), "foo(bar=\"a\", spam=None)");
    }

    #[test]
    fn test_format_call_extras() {
        let args = CallArgs::new()
            .arg("a")
            .arg(2)
            .arg(3)
            .arg(4)
            .kwarg("extra", true);
        assert_eq!(
            format_call(&foo(), &args),
            "foo(bar=\"a\", spam=2, *(3, 4), **{\"extra\": true})"
        );
    }

    #[test]
    fn test_format_call_keyword_params() {
        let args = CallArgs::new().kwarg("spam", "x").kwarg("bar", 1);
        assert_eq!(format_call(&foo(), &args), "foo(bar=1, spam=\"x\")");
    }

    #[test]
    fn test_format_exit() {
        assert_eq!(format_exit(&foo(), 0.4242), "Exit foo -- Time in function: 0.42s");
    }

    #[test]
    fn test_logger_resolution() {
        let f = |_: &()| Ok::<_, DecorumError>(());
        assert_eq!(log_it(foo(), f).logger(), "decorum");
        assert_eq!(log_it(foo().in_module("app::users"), f).logger(), "app::users");
        assert_eq!(LogIt::with_logger("audit").wrap(foo().in_module("x"), f).logger(), "audit");
    }

    #[test]
    fn test_call_returns_value() {
        let timed = log_it(Signature::new("id").param("x"), |a: &(u8,)| Ok::<_, DecorumError>(a.0));
        assert_eq!(timed.call(&(9,)).unwrap(), 9);
    }
}
