//! Requirements that test keys in a request store.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::checks::{Contains, FnCheck, MatchContext, TimestampAge, ValueCheck};
use crate::error::Error;
use crate::request::{KeyStore, Request, StoreKind};
use crate::requirement::{Leaf, LeafCheck, Node, Requirement, RequirementKind, DEFAULT_CATEGORY};
use crate::target::RedirectTarget;

/// Judges a value fetched for a [`Need`].
///
/// Plain values convert into [`Acceptor::Equals`]; [`TimestampAge`],
/// [`Contains`] and [`MatchContext`] into [`Acceptor::Check`]. Lists of
/// acceptable values are built with [`Acceptor::one_of`] so that a JSON
/// array can still be matched literally.
#[derive(Clone)]
pub enum Acceptor {
    /// The value must equal this one.
    Equals(Value),
    /// The value must equal one of these.
    OneOf(Vec<Value>),
    /// The value must pass this check.
    Check(Arc<dyn ValueCheck>),
}

impl Acceptor {
    /// Accepts values equal to `value`.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    /// Accepts any of `values`.
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Accepts values for which `f` returns true.
    pub fn check<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Check(Arc::new(FnCheck(f)))
    }

    /// Accepts values that pass `check`.
    pub fn value_check(check: impl ValueCheck + 'static) -> Self {
        Self::Check(Arc::new(check))
    }

    /// Returns true if `value` is acceptable.
    pub fn accepts(&self, value: &Value, request: &dyn Request) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::OneOf(options) => options.contains(value),
            Self::Check(check) => check.accepts(value, request),
        }
    }
}

impl fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Self::OneOf(vs) => f.debug_tuple("OneOf").field(vs).finish(),
            Self::Check(_) => f.write_str("Check(..)"),
        }
    }
}

macro_rules! equals_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Acceptor {
                fn from(value: $ty) -> Self {
                    Self::Equals(value.into())
                }
            }
        )*
    };
}

equals_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);

impl From<TimestampAge> for Acceptor {
    fn from(check: TimestampAge) -> Self {
        Self::value_check(check)
    }
}

impl From<Contains> for Acceptor {
    fn from(check: Contains) -> Self {
        Self::value_check(check)
    }
}

impl From<MatchContext> for Acceptor {
    fn from(check: MatchContext) -> Self {
        Self::value_check(check)
    }
}

/// One entry of a key-check requirement.
///
/// # Examples
///
/// ```
/// use request_guard::{Acceptor, Need};
///
/// let present: Need = "user_id".into();
/// let exact: Need = ("role", "admin").into();
/// let any: Need = Need::accepts("role", Acceptor::one_of(["admin", "owner"]));
/// assert_eq!(present.key(), "user_id");
/// assert_eq!(exact.key(), "role");
/// assert_eq!(any.key(), "role");
/// ```
#[derive(Debug, Clone)]
pub enum Need {
    /// The key must be present with a non-null value.
    Present(String),
    /// The key must be present and its value acceptable.
    Accepts(String, Acceptor),
}

impl Need {
    /// The key must be present with a non-null value.
    pub fn present(key: impl Into<String>) -> Self {
        Self::Present(key.into())
    }

    /// The key must be present and its value accepted by `acceptor`.
    pub fn accepts(key: impl Into<String>, acceptor: impl Into<Acceptor>) -> Self {
        Self::Accepts(key.into(), acceptor.into())
    }

    /// The key this entry tests.
    pub fn key(&self) -> &str {
        match self {
            Self::Present(key) | Self::Accepts(key, _) => key,
        }
    }

    fn is_met(&self, store: &dyn KeyStore, request: &dyn Request) -> bool {
        if !store.contains(self.key()) {
            return false;
        }
        // A present key the store cannot hand back reads as null.
        let value = store.fetch(self.key()).unwrap_or(Value::Null);
        match self {
            Self::Present(_) => !value.is_null(),
            Self::Accepts(_, acceptor) => acceptor.accepts(&value, request),
        }
    }
}

impl From<&str> for Need {
    fn from(key: &str) -> Self {
        Self::present(key)
    }
}

impl From<String> for Need {
    fn from(key: String) -> Self {
        Self::present(key)
    }
}

impl<K, A> From<(K, A)> for Need
where
    K: Into<String>,
    A: Into<Acceptor>,
{
    fn from((key, acceptor): (K, A)) -> Self {
        Self::accepts(key, acceptor)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct KeyCheck {
    store: StoreKind,
    needs: Vec<Need>,
}

impl KeyCheck {
    pub(crate) fn kind(&self) -> RequirementKind {
        match self.store {
            StoreKind::Session => RequirementKind::Session,
            StoreKind::Values => RequirementKind::Values,
            StoreKind::Context => RequirementKind::Context,
        }
    }

    /// All entries must be met; stops at the first that is not.
    pub(crate) fn evaluate(&self, request: &dyn Request) -> bool {
        let store = self.store.select(request);
        self.needs.iter().all(|need| need.is_met(store, request))
    }
}

fn key_check<I, N>(
    store: StoreKind,
    needs: I,
    target: RedirectTarget,
) -> Result<Requirement, Error>
where
    I: IntoIterator<Item = N>,
    N: Into<Need>,
{
    let needs: Vec<Need> = needs.into_iter().map(Into::into).collect();
    if needs.is_empty() {
        return Err(Error::invalid_argument(format!(
            "{} requirement needs at least one key",
            store
        )));
    }
    if needs.iter().any(|need| need.key().is_empty()) {
        return Err(Error::invalid_argument(format!(
            "{} keys must not be empty",
            store
        )));
    }

    Ok(Requirement::from_node(Node::Leaf(Leaf {
        check: LeafCheck::Keys(KeyCheck { store, needs }),
        target,
        message: None,
        category: DEFAULT_CATEGORY.to_string(),
    })))
}

/// Builds requirements over the client session.
///
/// # Examples
///
/// ```
/// use request_guard::{Args, SessionRequire};
/// use request_guard::web::RequestAdapter;
///
/// let req = SessionRequire::new([("a", "A"), ("b", "B")], "index").unwrap();
///
/// let adapter = RequestAdapter::new("req-1").with_session("a", "A");
/// assert!(!req.check(&adapter, &Args::new()).unwrap());
///
/// adapter.session_store().insert("b", "B");
/// assert!(req.check(&adapter, &Args::new()).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SessionRequire;

impl SessionRequire {
    /// A requirement that every entry of `needs` holds in the session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `needs` is empty or names an empty key.
    pub fn new<I, N>(needs: I, target: impl Into<RedirectTarget>) -> Result<Requirement, Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<Need>,
    {
        key_check(StoreKind::Session, needs, target.into())
    }
}

/// Builds requirements over query-string and form values.
#[derive(Debug, Clone, Copy)]
pub struct ValueRequire;

impl ValueRequire {
    /// A requirement that every entry of `needs` holds in the request values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `needs` is empty or names an empty key.
    pub fn new<I, N>(needs: I, target: impl Into<RedirectTarget>) -> Result<Requirement, Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<Need>,
    {
        key_check(StoreKind::Values, needs, target.into())
    }
}

/// Builds requirements over the per-request context bag.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequire;

impl ContextRequire {
    /// A requirement that every entry of `needs` holds in the request context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `needs` is empty or names an empty key.
    pub fn new<I, N>(needs: I, target: impl Into<RedirectTarget>) -> Result<Requirement, Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<Need>,
    {
        key_check(StoreKind::Context, needs, target.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::error::ErrorKind;
    use crate::web::RequestAdapter;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn passes(req: &Requirement, adapter: &RequestAdapter) -> bool {
        req.check(adapter, &Args::new()).unwrap()
    }

    #[test]
    fn bare_key_needs_non_null_value() {
        let req = SessionRequire::new(["user"], "index").unwrap();

        assert!(!passes(&req, &RequestAdapter::new("r")));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("user", Value::Null)));
        assert!(passes(&req, &RequestAdapter::new("r").with_session("user", "alice")));
        assert!(passes(&req, &RequestAdapter::new("r").with_session("user", "")));
    }

    #[test]
    fn literal_acceptor() {
        let req = SessionRequire::new([("a", "A")], "index").unwrap();

        assert!(passes(&req, &RequestAdapter::new("r").with_session("a", "A")));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("a", "B")));
        assert!(!passes(&req, &RequestAdapter::new("r")));
    }

    #[test]
    fn null_literal_matches_stored_null() {
        let req = SessionRequire::new([("token", Value::Null)], "index").unwrap();

        assert!(passes(&req, &RequestAdapter::new("r").with_session("token", Value::Null)));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("token", "abc")));
        assert!(!passes(&req, &RequestAdapter::new("r")));
    }

    struct KeysOnly;

    impl KeyStore for KeysOnly {
        fn contains(&self, key: &str) -> bool {
            key == "token"
        }

        fn fetch(&self, _key: &str) -> Option<Value> {
            None
        }
    }

    #[test]
    fn present_key_without_value_reads_as_null() {
        let store = KeysOnly;
        let adapter = RequestAdapter::new("r");

        let null = Need::accepts("token", Value::Null);
        assert!(null.is_met(&store, &adapter));
        assert!(!Need::present("token").is_met(&store, &adapter));
        assert!(!Need::accepts("other", Value::Null).is_met(&store, &adapter));
    }

    #[test]
    fn one_of_acceptor() {
        let req = SessionRequire::new(
            [Need::accepts("role", Acceptor::one_of(["admin", "owner"]))],
            "index",
        )
        .unwrap();

        assert!(passes(&req, &RequestAdapter::new("r").with_session("role", "owner")));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("role", "guest")));
    }

    #[test]
    fn array_literal_is_matched_exactly() {
        let req = SessionRequire::new([("tags", json!(["a", "b"]))], "index").unwrap();

        assert!(passes(&req, &RequestAdapter::new("r").with_session("tags", json!(["a", "b"]))));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("tags", "a")));
    }

    #[test]
    fn predicate_acceptor() {
        let req = SessionRequire::new(
            [("x", Acceptor::check(|v| v.as_i64().is_some_and(|x| x & 1 == 1)))],
            "index",
        )
        .unwrap();

        assert!(passes(&req, &RequestAdapter::new("r").with_session("x", 3)));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("x", 2)));
        assert!(!passes(&req, &RequestAdapter::new("r").with_session("x", "3")));
    }

    #[test]
    fn value_checks_as_acceptors() {
        let req = SessionRequire::new(
            [
                Need::accepts("roles", Contains::new("admin")),
                Need::accepts("owner", MatchContext::new("current_user")),
            ],
            "index",
        )
        .unwrap();

        let adapter = RequestAdapter::new("r")
            .with_session("roles", json!(["user", "admin"]))
            .with_session("owner", "alice")
            .with_context("current_user", "alice");
        assert!(passes(&req, &adapter));

        adapter.context_store().insert("current_user", "bob");
        assert!(!passes(&req, &adapter));
    }

    #[test]
    fn needs_are_a_conjunction() {
        let req = SessionRequire::new([("a", "A"), ("b", "B"), ("c", "C")], "index").unwrap();

        for mask in 0..8u8 {
            let adapter = RequestAdapter::new("r");
            for (bit, key, value) in [(1, "a", "A"), (2, "b", "B"), (4, "c", "C")] {
                if mask & bit != 0 {
                    adapter.session_store().insert(key, value);
                }
            }
            assert_eq!(passes(&req, &adapter), mask == 7, "mask {}", mask);
        }
    }

    #[test]
    fn stops_at_first_unmet_need() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let req = SessionRequire::new(
            [
                Need::accepts("a", "A"),
                Need::accepts(
                    "b",
                    Acceptor::check(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        true
                    }),
                ),
            ],
            "index",
        )
        .unwrap();

        let adapter = RequestAdapter::new("r").with_session("b", "B");
        assert!(!passes(&req, &adapter));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn each_variant_reads_its_own_store() {
        let session = SessionRequire::new(["k"], "index").unwrap();
        let values = ValueRequire::new(["k"], "index").unwrap();
        let context = ContextRequire::new(["k"], "index").unwrap();

        assert_eq!(session.kind(), RequirementKind::Session);
        assert_eq!(values.kind(), RequirementKind::Values);
        assert_eq!(context.kind(), RequirementKind::Context);

        let only_values = RequestAdapter::new("r").with_value("k", "v");
        assert!(!passes(&session, &only_values));
        assert!(passes(&values, &only_values));
        assert!(!passes(&context, &only_values));

        let only_context = RequestAdapter::new("r").with_context("k", "v");
        assert!(passes(&context, &only_context));
    }

    #[test]
    fn rejects_empty_needs_and_keys() {
        let empty: [&str; 0] = [];
        let err = SessionRequire::new(empty, "index").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ValueRequire::new([""], "index").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ContextRequire::new([("", "x")], "index").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
