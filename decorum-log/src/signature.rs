//! Declared function signatures and argument binding.
//!
//! A [`Signature`] lists a function's parameters (and their defaults) up
//! front, so a [`CallArgs`] record can be matched to parameter names without
//! any runtime reflection.

use std::collections::BTreeMap;

use decorum_core::error::Result;
use decorum_core::value::{ArgValue, CallArgs, ToArg};

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Value used when the caller omits the parameter
    pub default: Option<ArgValue>,
}

/// Name and parameter list of a wrapped function.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    name: String,
    module: Option<String>,
    params: Vec<Param>,
}

impl Signature {
    /// Starts a signature for `name` with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            params: Vec::new(),
        }
    }

    /// Records the module the function lives in (usually `module_path!()`).
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Adds a parameter with a default value.
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl ToArg) -> Result<Self> {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.to_arg()?),
        });
        Ok(self)
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module, if recorded.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Declared parameters in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Matches a call record against the declared parameters.
    ///
    /// Positional values bind to parameters in order; keywords bind by name.
    /// Positional values beyond the parameter list and keywords naming no
    /// parameter are kept apart as extras.
    pub fn bind(&self, args: &CallArgs) -> BoundCall {
        let positional = args.positional();
        let split = positional.len().min(self.params.len());

        let by_position: Vec<(String, ArgValue)> = self.params[..split]
            .iter()
            .zip(positional)
            .map(|(p, v)| (p.name.clone(), v.clone()))
            .collect();

        let mut by_keyword = Vec::new();
        let mut unfilled = Vec::new();
        for param in &self.params[split..] {
            match args.get(&param.name) {
                Some(v) => by_keyword.push((param.name.clone(), v.clone())),
                None => unfilled.push(param.clone()),
            }
        }

        let extra_keyword: BTreeMap<String, ArgValue> = args
            .keyword()
            .iter()
            .filter(|(name, _)| !self.params.iter().any(|p| &p.name == *name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        BoundCall {
            by_position,
            by_keyword,
            unfilled,
            extra_positional: positional[split..].to_vec(),
            extra_keyword,
        }
    }
}

/// A call record matched against a [`Signature`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundCall {
    /// Parameters filled positionally, in order
    pub by_position: Vec<(String, ArgValue)>,
    /// Parameters filled by keyword, in declaration order
    pub by_keyword: Vec<(String, ArgValue)>,
    /// Parameters the caller did not supply
    pub unfilled: Vec<Param>,
    /// Positional values beyond the declared parameters (`*args`)
    pub extra_positional: Vec<ArgValue>,
    /// Keywords naming no declared parameter (`**kwargs`)
    pub extra_keyword: BTreeMap<String, ArgValue>,
}

impl BoundCall {
    /// Supplied parameters followed by defaults of omitted ones.
    pub fn with_defaults(&self) -> Vec<(String, ArgValue)> {
        self.by_position
            .iter()
            .chain(&self.by_keyword)
            .cloned()
            .chain(
                self.unfilled
                    .iter()
                    .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d))),
            )
            .collect()
    }
}

/// Renders `a, b, c` for a sequence of values.
pub(crate) fn join_values(values: &[ArgValue]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> Signature {
        Signature::new("foo")
            .param("bar")
            .param_with_default("spam", ArgValue::None)
            .unwrap()
            .param_with_default("eggs", 3)
            .unwrap()
    }

    #[test]
    fn test_bind_positional_and_keyword() {
        let args = CallArgs::new().arg("a").kwarg("eggs", 4);
        let bound = foo().bind(&args);

        assert_eq!(bound.by_position, vec![("bar".to_string(), ArgValue::Str("a".into()))]);
        assert_eq!(bound.by_keyword, vec![("eggs".to_string(), ArgValue::Int(4))]);
        assert_eq!(bound.unfilled.len(), 1);
        assert_eq!(bound.unfilled[0].name, "spam");
        assert!(bound.extra_positional.is_empty());
        assert!(bound.extra_keyword.is_empty());
    }

    #[test]
    fn test_bind_extras() {
        let args = CallArgs::new()
            .arg("a")
            .arg("first star")
            .arg(1)
            .arg("second star")
            .kwarg("something", "boo");
        let bound = foo().bind(&args);

        assert_eq!(bound.by_position.len(), 3);
        assert_eq!(bound.extra_positional, vec![ArgValue::Str("second star".into())]);
        assert_eq!(bound.extra_keyword.get("something"), Some(&ArgValue::Str("boo".into())));
    }

    #[test]
    fn test_with_defaults_fills_omitted() {
        let bound = foo().bind(&CallArgs::new().arg("a"));
        let filled = bound.with_defaults();
        let names: Vec<_> = filled.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["bar", "spam", "eggs"]);
        assert_eq!(filled[2].1, ArgValue::Int(3));
    }

    #[test]
    fn test_required_param_without_value_is_skipped() {
        let bound = foo().bind(&CallArgs::new());
        let names: Vec<_> = bound.with_defaults().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["spam", "eggs"]);
    }
}
