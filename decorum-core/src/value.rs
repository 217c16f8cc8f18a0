//! Argument values and call records.
//!
//! Rust functions have no runtime argument introspection, so wrapped calls
//! describe their arguments explicitly as a [`CallArgs`] record: positional
//! values plus keyword values. Both cache keys and log lines are rendered
//! from this record.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use crate::error::{DecorumError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENT VALUES
// ═══════════════════════════════════════════════════════════════════════════════

/// A dynamically typed argument value.
///
/// The `Display` form is unambiguous: strings are quoted and escaped,
/// floats always carry a decimal point or exponent, containers are delimited.
/// Distinct values therefore never render to the same text.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Absent value (`None`, `()`).
    None,
    /// Boolean.
    Bool(bool),
    /// Any integer up to 128 bits.
    Int(i128),
    /// Finite floating point number.
    Float(f64),
    /// UTF-8 text.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence (lists, tuples, slices).
    Seq(Vec<ArgValue>),
    /// String-keyed mapping, kept sorted by key.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Creates a byte-string value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        ArgValue::Bytes(data.into())
    }

    /// Creates a float value, rejecting NaN and infinities.
    pub fn float(value: f64) -> Result<Self> {
        if value.is_finite() {
            Ok(ArgValue::Float(value))
        } else {
            Err(DecorumError::EncodingError(format!(
                "non-finite float {value} has no stable key form"
            )))
        }
    }

    /// Returns true for [`ArgValue::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, ArgValue::None)
    }

    /// Writes the key form of this value, failing on values that cannot
    /// be encoded without risking a collision.
    pub(crate) fn write_key(&self, out: &mut String) -> Result<()> {
        match self {
            ArgValue::Float(f) if !f.is_finite() => Err(DecorumError::EncodingError(format!(
                "non-finite float {f} has no stable key form"
            ))),
            ArgValue::Seq(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_key(out)?;
                }
                out.push(']');
                Ok(())
            }
            ArgValue::Map(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&format!("{k:?}: "));
                    v.write_key(out)?;
                }
                out.push('}');
                Ok(())
            }
            other => {
                out.push_str(&other.to_string());
                Ok(())
            }
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::None => f.write_str("None"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Float(x) => write!(f, "{x:?}"),
            ArgValue::Str(s) => write!(f, "{s:?}"),
            ArgValue::Bytes(b) => {
                f.write_str("b\"")?;
                for byte in b {
                    write!(f, "{}", std::ascii::escape_default(*byte))?;
                }
                f.write_str("\"")
            }
            ArgValue::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ArgValue::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Conversion of a Rust value into an [`ArgValue`].
///
/// Implement this for your own argument types to make them usable in
/// memoized, logged or profiled calls.
pub trait ToArg {
    /// Converts `self`; fails when the value has no stable textual form.
    fn to_arg(&self) -> Result<ArgValue>;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Result<ArgValue> {
        (**self).to_arg()
    }
}

impl ToArg for ArgValue {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(self.clone())
    }
}

impl ToArg for () {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::None)
    }
}

impl ToArg for bool {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Bool(*self))
    }
}

macro_rules! int_to_arg {
    ($($t:ty),*) => {
        $(
            impl ToArg for $t {
                fn to_arg(&self) -> Result<ArgValue> {
                    Ok(ArgValue::Int(i128::from(*self)))
                }
            }
        )*
    };
}

int_to_arg!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl ToArg for isize {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Int(*self as i128))
    }
}

impl ToArg for usize {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Int(*self as i128))
    }
}

impl ToArg for u128 {
    fn to_arg(&self) -> Result<ArgValue> {
        i128::try_from(*self)
            .map(ArgValue::Int)
            .map_err(|_| DecorumError::EncodingError(format!("integer {self} exceeds 128-bit signed range")))
    }
}

impl ToArg for f32 {
    fn to_arg(&self) -> Result<ArgValue> {
        ArgValue::float(f64::from(*self))
    }
}

impl ToArg for f64 {
    fn to_arg(&self) -> Result<ArgValue> {
        ArgValue::float(*self)
    }
}

impl ToArg for char {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Str(self.to_string()))
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Str(self.to_owned()))
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Result<ArgValue> {
        Ok(ArgValue::Str(self.clone()))
    }
}

impl<T: ToArg> ToArg for Option<T> {
    fn to_arg(&self) -> Result<ArgValue> {
        match self {
            Some(v) => v.to_arg(),
            None => Ok(ArgValue::None),
        }
    }
}

impl<T: ToArg> ToArg for [T] {
    fn to_arg(&self) -> Result<ArgValue> {
        self.iter().map(ToArg::to_arg).collect::<Result<Vec<_>>>().map(ArgValue::Seq)
    }
}

impl<T: ToArg, const N: usize> ToArg for [T; N] {
    fn to_arg(&self) -> Result<ArgValue> {
        self.as_slice().to_arg()
    }
}

impl<T: ToArg> ToArg for Vec<T> {
    fn to_arg(&self) -> Result<ArgValue> {
        self.as_slice().to_arg()
    }
}

impl<T: ToArg> ToArg for BTreeMap<String, T> {
    fn to_arg(&self) -> Result<ArgValue> {
        self.iter()
            .map(|(k, v)| Ok((k.clone(), v.to_arg()?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(ArgValue::Map)
    }
}

impl<T: ToArg, S: BuildHasher> ToArg for HashMap<String, T, S> {
    fn to_arg(&self) -> Result<ArgValue> {
        self.iter()
            .map(|(k, v)| Ok((k.clone(), v.to_arg()?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(ArgValue::Map)
    }
}

impl ToArg for serde_json::Value {
    fn to_arg(&self) -> Result<ArgValue> {
        use serde_json::Value;

        Ok(match self {
            Value::Null => ArgValue::None,
            Value::Bool(b) => ArgValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => ArgValue::Int(i128::from(i)),
                (None, Some(u), _) => ArgValue::Int(i128::from(u)),
                (None, None, Some(f)) => ArgValue::float(f)?,
                _ => {
                    return Err(DecorumError::EncodingError(format!(
                        "JSON number {n} is not representable"
                    )))
                }
            },
            Value::String(s) => ArgValue::Str(s.clone()),
            Value::Array(items) => items.as_slice().to_arg()?,
            Value::Object(map) => ArgValue::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_arg()?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

macro_rules! tuple_to_arg {
    ($($name:ident),+) => {
        impl<$($name: ToArg),+> ToArg for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_arg(&self) -> Result<ArgValue> {
                let ($($name,)+) = self;
                Ok(ArgValue::Seq(vec![$($name.to_arg()?),+]))
            }
        }
    };
}

tuple_to_arg!(A, B);
tuple_to_arg!(A, B, C);
tuple_to_arg!(A, B, C, D);

// ═══════════════════════════════════════════════════════════════════════════════
// CALL RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Arguments of a single call: positional values and keyword values.
///
/// Keyword arguments are stored sorted by name, so the order they were
/// supplied in never matters. Conversion failures are remembered and
/// reported by [`CallArgs::validate`] instead of panicking mid-build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
    invalid: Option<String>,
}

impl CallArgs {
    /// Creates an empty call record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a positional argument.
    pub fn arg(mut self, value: impl ToArg) -> Self {
        self.push_arg(value);
        self
    }

    /// Adds a keyword argument. A repeated name replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl ToArg) -> Self {
        self.push_kwarg(name, value);
        self
    }

    /// Appends a positional argument in place.
    pub fn push_arg(&mut self, value: impl ToArg) {
        match value.to_arg() {
            Ok(v) => self.positional.push(v),
            Err(e) => self.remember(format!("positional #{}: {e}", self.positional.len())),
        }
    }

    /// Sets a keyword argument in place.
    pub fn push_kwarg(&mut self, name: impl Into<String>, value: impl ToArg) {
        let name = name.into();
        match value.to_arg() {
            Ok(v) => {
                self.keyword.insert(name, v);
            }
            Err(e) => self.remember(format!("keyword '{name}': {e}")),
        }
    }

    fn remember(&mut self, reason: String) {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
    }

    /// Positional arguments in call order.
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// Keyword arguments sorted by name.
    pub fn keyword(&self) -> &BTreeMap<String, ArgValue> {
        &self.keyword
    }

    /// Looks up a keyword argument.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.keyword.get(name)
    }

    /// Removes a keyword argument, returning it.
    pub fn remove(&mut self, name: &str) -> Option<ArgValue> {
        self.keyword.remove(name)
    }

    /// Returns true when no argument was supplied.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Fails with `EncodingError` if any argument could not be converted.
    pub fn validate(&self) -> Result<()> {
        match &self.invalid {
            Some(reason) => Err(DecorumError::EncodingError(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Types that describe themselves as a call record.
///
/// Implemented for [`CallArgs`], `()` and tuples of [`ToArg`] values (which
/// become purely positional calls).
pub trait IntoCallArgs {
    /// Builds the call record for these arguments.
    fn to_call_args(&self) -> CallArgs;
}

impl IntoCallArgs for CallArgs {
    fn to_call_args(&self) -> CallArgs {
        self.clone()
    }
}

impl IntoCallArgs for () {
    fn to_call_args(&self) -> CallArgs {
        CallArgs::new()
    }
}

macro_rules! tuple_call_args {
    ($($name:ident),+) => {
        impl<$($name: ToArg),+> IntoCallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_call_args(&self) -> CallArgs {
                let ($($name,)+) = self;
                CallArgs::new()$(.arg($name))+
            }
        }
    };
}

tuple_call_args!(A);
tuple_call_args!(A, B);
tuple_call_args!(A, B, C);
tuple_call_args!(A, B, C, D);
tuple_call_args!(A, B, C, D, E);
tuple_call_args!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ArgValue::Int(1), "1" ; "int")]
    #[test_case(ArgValue::Float(1.0), "1.0" ; "float keeps decimal point")]
    #[test_case(ArgValue::Str("1".into()), "\"1\"" ; "string is quoted")]
    #[test_case(ArgValue::bytes(b"a\"b".to_vec()), "b\"a\\\"b\"" ; "bytes are escaped")]
    #[test_case(ArgValue::None, "None" ; "none")]
    #[test_case(ArgValue::Bool(true), "true" ; "bool")]
    #[test_case(ArgValue::Seq(vec![ArgValue::Int(1), ArgValue::Str("a".into())]), "[1, \"a\"]" ; "sequence")]
    #[test_case(ArgValue::Map([("k".to_string(), ArgValue::Int(2))].into_iter().collect()), "{\"k\": 2}" ; "map")]
    fn test_display_is_unambiguous(value: ArgValue, expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(f64::NAN.to_arg().is_err());
        assert!(f64::INFINITY.to_arg().unwrap_err().is_encoding_error());
        assert!(1.5f64.to_arg().is_ok());
    }

    #[test]
    fn test_containers() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        assert_eq!(map.to_arg().unwrap().to_string(), "{\"a\": 1, \"b\": 2}");
        assert_eq!(vec![Some(1), None].to_arg().unwrap().to_string(), "[1, None]");
        assert_eq!((1, "x").to_arg().unwrap().to_string(), "[1, \"x\"]");
    }

    #[test]
    fn test_json_values() {
        let v = serde_json::json!({"n": 3, "f": 0.5, "list": [true, null]});
        assert_eq!(
            v.to_arg().unwrap().to_string(),
            "{\"f\": 0.5, \"list\": [true, None], \"n\": 3}"
        );
    }

    #[test]
    fn test_call_args_remembers_first_failure() {
        let args = CallArgs::new().arg(1).arg(f64::NAN).kwarg("x", f32::INFINITY);
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("positional #1"));
        assert_eq!(args.positional().len(), 1);
    }

    #[test]
    fn test_kwargs_sorted_and_replaced() {
        let args = CallArgs::new().kwarg("b", 2).kwarg("a", 1).kwarg("b", 3);
        let names: Vec<_> = args.keyword().keys().cloned().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(args.get("b"), Some(&ArgValue::Int(3)));
    }

    #[test]
    fn test_tuple_call_args() {
        let args = (1u8, "two", 3.0f64).to_call_args();
        assert_eq!(args.positional().len(), 3);
        assert!(args.keyword().is_empty());
        assert!(().to_call_args().is_empty());
    }
}
