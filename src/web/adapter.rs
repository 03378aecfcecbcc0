//! In-memory request adapter for hosts without a framework binding.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::request::{KeyStore, MapStore, Request};

/// A flash message queued during a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    /// Category such as `"warning"` or `"error"`.
    pub category: String,
    /// Message text shown to the user.
    pub message: String,
}

/// A self-contained [`Request`] built from owned data.
///
/// `RequestAdapter` carries the three key/value stores requirements read,
/// the current path, a table of named endpoints for `url_for`, and collects
/// flashed messages. Framework integrations can build one per request, or
/// implement [`Request`] directly on their own request type.
///
/// # Examples
///
/// ```
/// use request_guard::{Request, SessionRequire};
/// use request_guard::web::RequestAdapter;
///
/// let adapter = RequestAdapter::new("req-12345")
///     .with_endpoint("login", "/login")
///     .with_session("user_id", 7);
///
/// let logged_in = SessionRequire::new(["user_id"], "login")
///     .unwrap()
///     .with_flash("Please log in");
///
/// assert!(logged_in.call(&adapter).unwrap().is_none());
/// assert!(adapter.flashes().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    path: String,
    root_path: String,
    session: MapStore,
    values: MapStore,
    context: MapStore,
    endpoints: HashMap<String, String>,
    flashes: RefCell<Vec<FlashMessage>>,
}

impl RequestAdapter {
    /// Creates an adapter for the request at `/` with empty stores.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            path: "/".to_string(),
            root_path: String::new(),
            session: MapStore::new(),
            values: MapStore::new(),
            context: MapStore::new(),
            endpoints: HashMap::new(),
            flashes: RefCell::new(Vec::new()),
        }
    }

    /// Sets the request path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the application mount point, e.g. `/app`.
    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Registers the URL that `url_for(name)` resolves to.
    pub fn with_endpoint(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), url.into());
        self
    }

    /// Adds a session entry.
    pub fn with_session(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key, value);
        self
    }

    /// Adds a query-string or form value.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Adds a context entry.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key, value);
        self
    }

    /// The session store, writable through a shared reference.
    pub fn session_store(&self) -> &MapStore {
        &self.session
    }

    /// The request values store.
    pub fn values_store(&self) -> &MapStore {
        &self.values
    }

    /// The context store.
    pub fn context_store(&self) -> &MapStore {
        &self.context
    }

    /// Messages flashed so far, oldest first.
    pub fn flashes(&self) -> Vec<FlashMessage> {
        self.flashes.borrow().clone()
    }

    /// Drains the flashed messages, as the next page render would.
    pub fn take_flashes(&self) -> Vec<FlashMessage> {
        self.flashes.take()
    }
}

impl Request for RequestAdapter {
    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn session(&self) -> &dyn KeyStore {
        &self.session
    }

    fn values(&self) -> &dyn KeyStore {
        &self.values
    }

    fn context(&self) -> &dyn KeyStore {
        &self.context
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn root_path(&self) -> &str {
        &self.root_path
    }

    fn flash(&self, message: &str, category: &str) {
        self.flashes.borrow_mut().push(FlashMessage {
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    fn url_for(&self, endpoint: &str) -> Option<String> {
        self.endpoints.get(endpoint).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_adapter_new() {
        let adapter = RequestAdapter::new("req-test");
        assert_eq!(adapter.request_id(), "req-test");
        assert_eq!(adapter.path(), "/");
        assert_eq!(adapter.root_path(), "");
        assert!(adapter.flashes().is_empty());
    }

    #[test]
    fn builders_populate_stores() {
        let adapter = RequestAdapter::new("req-1")
            .with_session("user", "alice")
            .with_value("q", "rust")
            .with_context("role", "admin");

        assert_eq!(adapter.session().fetch("user"), Some(json!("alice")));
        assert_eq!(adapter.values().fetch("q"), Some(json!("rust")));
        assert_eq!(adapter.context().fetch("role"), Some(json!("admin")));
        assert!(!adapter.session().contains("q"));
    }

    #[test]
    fn stores_are_writable_through_shared_reference() {
        let adapter = RequestAdapter::new("req-1");
        adapter.session_store().insert("a", 1);
        assert!(adapter.session().contains("a"));
        adapter.session_store().remove("a");
        assert!(!adapter.session().contains("a"));
    }

    #[test]
    fn url_for_uses_registered_endpoints() {
        let adapter = RequestAdapter::new("req-1").with_endpoint("index", "/");
        assert_eq!(adapter.url_for("index").as_deref(), Some("/"));
        assert_eq!(adapter.url_for("other"), None);
    }

    #[test]
    fn flashes_accumulate_and_drain() {
        let adapter = RequestAdapter::new("req-1");
        adapter.flash("first", "warning");
        adapter.flash("second", "error");

        let drained = adapter.take_flashes();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].category, "error");
        assert_eq!(drained[1].message, "second");
        assert!(adapter.flashes().is_empty());
    }
}
