//! Cache key encoding.
//!
//! A key is the textual form of a call record:
//!
//! ```text
//! <prefix>(<positional>, ...){<"name">: <value>, ...}
//! ```
//!
//! Keyword arguments are emitted in sorted order, so `f(a=1, b=2)` and
//! `f(b=2, a=1)` encode identically. Values use the unambiguous
//! [`ArgValue`] text form, so differing arguments give differing keys.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::value::{ArgValue, CallArgs, ToArg};

/// An encoded cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Encodes a call record, optionally prefixed.
    ///
    /// Fails with `EncodingError` if any argument had no stable form.
    pub fn encode(args: &CallArgs, prefix: Option<&str>) -> Result<Self> {
        args.validate()?;

        let mut out = String::new();
        if let Some(prefix) = prefix {
            out.push_str(prefix);
        }

        out.push('(');
        for (i, value) in args.positional().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            value.write_key(&mut out)?;
        }
        out.push(')');

        out.push('{');
        for (i, (name, value)) in args.keyword().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("{name:?}: "));
            value.write_key(&mut out)?;
        }
        out.push('}');

        Ok(Self(out))
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Length of the key text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an empty key (never produced by [`CacheKey::encode`]).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Declared keyword defaults used to normalize call records before encoding.
///
/// A keyword argument that is `None`, or equal to its declared default,
/// is dropped, so `f(x)` and `f(x, spam=<default>)` share a key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyDefaults {
    defaults: BTreeMap<String, ArgValue>,
}

impl KeyDefaults {
    /// Creates an empty set of defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the default value of a keyword parameter.
    pub fn declare(&mut self, name: impl Into<String>, value: impl ToArg) -> Result<()> {
        self.defaults.insert(name.into(), value.to_arg()?);
        Ok(())
    }

    /// Returns the declared default for `name`.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.defaults.get(name)
    }

    /// Returns a copy of `args` without `None` and default-valued keywords.
    pub fn normalize(&self, args: &CallArgs) -> CallArgs {
        let mut normalized = args.clone();
        let redundant: Vec<String> = args
            .keyword()
            .iter()
            .filter(|(name, value)| value.is_none() || self.defaults.get(name.as_str()) == Some(*value))
            .map(|(name, _)| name.clone())
            .collect();

        for name in redundant {
            normalized.remove(&name);
        }
        normalized
    }
}
