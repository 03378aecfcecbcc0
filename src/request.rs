//! The boundary between requirements and the host web framework.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::{Map, Value};

/// Read access to one request-scoped key/value store.
///
/// Implemented by the host for its session, request values (merged query
/// string and form fields) and per-request context bag.
pub trait KeyStore {
    /// Returns true if `key` is present.
    fn contains(&self, key: &str) -> bool;

    /// Returns the value stored under `key`.
    fn fetch(&self, key: &str) -> Option<Value>;
}

impl KeyStore for HashMap<String, Value> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl KeyStore for BTreeMap<String, Value> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl KeyStore for Map<String, Value> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Everything a requirement may consume from the current request.
///
/// Requirements never hold on to a `Request`; it is passed into every
/// evaluation so that checks read fresh state each time.
pub trait Request {
    /// Identifier used to correlate log events.
    fn request_id(&self) -> &str;

    /// The session store of the current client.
    fn session(&self) -> &dyn KeyStore;

    /// Merged query-string and form values.
    fn values(&self) -> &dyn KeyStore;

    /// The per-request context bag.
    fn context(&self) -> &dyn KeyStore;

    /// Path of the current request, relative to the application root.
    fn path(&self) -> &str;

    /// Mount point of the application. Empty when mounted at `/`.
    fn root_path(&self) -> &str {
        ""
    }

    /// Queues a one-shot message for the page the client lands on next.
    fn flash(&self, message: &str, category: &str);

    /// Resolves a named endpoint to a URL.
    fn url_for(&self, endpoint: &str) -> Option<String>;
}

/// Selects which request store a key-check requirement reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// The client session.
    Session,
    /// Query-string and form values.
    Values,
    /// The per-request context bag.
    Context,
}

impl StoreKind {
    /// Returns the selected store of `request`.
    pub fn select<'r>(&self, request: &'r dyn Request) -> &'r dyn KeyStore {
        match self {
            Self::Session => request.session(),
            Self::Values => request.values(),
            Self::Context => request.context(),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Values => write!(f, "values"),
            Self::Context => write!(f, "context"),
        }
    }
}

/// In-memory store that can be written through a shared reference.
///
/// Handlers and checks only see `&dyn Request`, so writes into a request's
/// context bag during evaluation go through interior mutability.
///
/// # Examples
///
/// ```
/// use request_guard::{KeyStore, MapStore};
/// use serde_json::json;
///
/// let store = MapStore::new();
/// store.insert("user_id", 42);
///
/// assert!(store.contains("user_id"));
/// assert_eq!(store.fetch("user_id"), Some(json!(42)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapStore {
    entries: RefCell<HashMap<String, Value>>,
}

impl MapStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.borrow_mut().remove(key)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyStore for MapStore {
    fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MapStore {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: RefCell::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}
