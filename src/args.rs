//! Named handler arguments and explicit parameter manifests.
//!
//! Handlers declare the names of the arguments they accept through a
//! [`Signature`]. Incoming calls carry positional and keyword values
//! ([`CallArgs`]) which are bound against the signature into a single
//! name→value map ([`Args`]). Function requirements read their inputs from
//! that map.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::Error;

/// Named argument values, keyed by parameter name.
///
/// # Examples
///
/// ```
/// use request_guard::Args;
/// use serde_json::json;
///
/// let args: Args = [("first", json!(2)), ("second", json!(1))].into_iter().collect();
/// assert_eq!(args.get("first"), Some(&json!(2)));
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<String, Value>,
}

impl Args {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named value, returning the map for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a named value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over the bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of bound names.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Restricts the map to exactly `names`.
    ///
    /// # Errors
    ///
    /// Returns an `ArgumentBinding` error naming the first missing argument.
    pub(crate) fn project(&self, names: &BTreeSet<String>) -> Result<Args, Error> {
        let mut projected = Args::new();
        for name in names {
            let value = self.values.get(name).ok_or_else(|| {
                Error::argument_binding(format!("missing argument '{}'", name))
            })?;
            projected.values.insert(name.clone(), value.clone());
        }
        Ok(projected)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The raw arguments of one handler invocation.
///
/// Positional values are matched to parameters by declaration order;
/// keyword values by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a keyword value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }
}

impl From<Args> for CallArgs {
    fn from(args: Args) -> Self {
        Self {
            positional: Vec::new(),
            keyword: args.values.into_iter().collect(),
        }
    }
}

/// The declared parameter names of a handler, in order.
///
/// # Examples
///
/// ```
/// use request_guard::{CallArgs, Signature};
/// use serde_json::json;
///
/// let signature = Signature::new(["first", "second"]).unwrap();
/// let bound = signature
///     .bind(CallArgs::new().arg(2).kwarg("second", 1))
///     .unwrap();
///
/// assert_eq!(bound.get("first"), Some(&json!(2)));
/// assert_eq!(bound.get("second"), Some(&json!(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<String>,
}

impl Signature {
    /// Creates a signature from parameter names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty or duplicated names.
    pub fn new<I, S>(params: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        validate_names(&params)?;
        Ok(Self { params })
    }

    /// A signature with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns true if `name` is a declared parameter.
    pub fn accepts(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// Binds call arguments to parameter names.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` when there are more positional values than
    /// parameters, a keyword names an unknown parameter, a parameter is bound
    /// twice, or a parameter is left unbound.
    pub fn bind(&self, call: CallArgs) -> Result<Args, Error> {
        if call.positional.len() > self.params.len() {
            return Err(Error::argument_binding(format!(
                "expected at most {} positional arguments, got {}",
                self.params.len(),
                call.positional.len()
            )));
        }

        let mut bound = Args::new();
        for (name, value) in self.params.iter().zip(call.positional) {
            bound.values.insert(name.clone(), value);
        }

        for (name, value) in call.keyword {
            if !self.accepts(&name) {
                return Err(Error::argument_binding(format!(
                    "unexpected argument '{}'",
                    name
                )));
            }
            if bound.values.insert(name.clone(), value).is_some() {
                return Err(Error::argument_binding(format!(
                    "multiple values for argument '{}'",
                    name
                )));
            }
        }

        if let Some(missing) = self.params.iter().find(|p| !bound.contains(p)) {
            return Err(Error::argument_binding(format!(
                "missing argument '{}'",
                missing
            )));
        }

        Ok(bound)
    }
}

/// Rejects empty and duplicated argument names.
pub(crate) fn validate_names(names: &[String]) -> Result<(), Error> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.is_empty() {
            return Err(Error::invalid_argument("argument names must not be empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(Error::invalid_argument(format!(
                "duplicate argument name '{}'",
                name
            )));
        }
    }
    Ok(())
}
