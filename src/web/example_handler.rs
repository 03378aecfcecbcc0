//! Example views guarded by requirements.
//!
//! These show the usual shapes: a login gate on the session, a role and
//! freshness check with an error flash, a guard reading a route variable,
//! and a group-wide gate.
//!
//! **These examples are for documentation and testing only.**

use serde_json::Value;

use crate::error::Error;
use crate::handler::{Guarded, Handler};
use crate::keycheck::{Acceptor, Need, SessionRequire};
use crate::request::Request;
use crate::target::RedirectTarget;
use crate::{Require, TimestampAge};

use super::RouteGroup;

fn session_str(request: &dyn Request, key: &str) -> String {
    request
        .session()
        .fetch(key)
        .map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// A dashboard for logged-in users.
///
/// Anonymous visitors go to the `login` endpoint with a warning flash.
///
/// # Examples
///
/// ```
/// use request_guard::CallArgs;
/// use request_guard::web::{RequestAdapter, example_handler::dashboard};
///
/// let view = dashboard().unwrap();
/// let adapter = RequestAdapter::new("req-dash-001")
///     .with_endpoint("login", "/login")
///     .with_session("user_id", "alice");
///
/// let page = view.call(&adapter, CallArgs::new()).unwrap().into_handled();
/// assert_eq!(page.as_deref(), Some("Welcome back, alice"));
/// ```
///
/// # Errors
///
/// Never fails for these fixed arguments; the `Result` mirrors the
/// constructors it uses.
pub fn dashboard() -> Result<Guarded<String>, Error> {
    let logged_in = SessionRequire::new(["user_id"], "login")?.with_flash("Please log in");
    logged_in.guard(Handler::new("dashboard", |request| {
        format!("Welcome back, {}", session_str(request, "user_id"))
    }))
}

/// An admin page requiring an admin role and a login within the last hour.
///
/// Failures go to the `login` endpoint with an `error` flash.
///
/// # Errors
///
/// Never fails for these fixed arguments.
pub fn admin_panel() -> Result<Guarded<String>, Error> {
    let admin = SessionRequire::new(
        [
            Need::accepts("role", Acceptor::one_of(["admin", "owner"])),
            Need::accepts("login_at", TimestampAge::parse("1h")?),
        ],
        "login",
    )?
    .with_flash("Administrators only, please log in again")
    .with_category("error");

    admin.guard(Handler::new("admin_panel", |request| {
        format!("Admin panel for {}", session_str(request, "role"))
    }))
}

/// A document view that only opens documents listed in the session.
///
/// Other documents redirect one level up from the current path.
///
/// # Examples
///
/// ```
/// use request_guard::CallArgs;
/// use request_guard::web::{RequestAdapter, example_handler::document};
/// use serde_json::json;
///
/// let view = document().unwrap();
/// let adapter = RequestAdapter::new("req-doc-001")
///     .with_path("/docs/7")
///     .with_session("docs", json!([3, 5]));
///
/// let response = view.call(&adapter, CallArgs::new().arg(7)).unwrap();
/// assert_eq!(response.redirect().unwrap().location(), "/docs/");
/// ```
///
/// # Errors
///
/// Never fails for these fixed arguments.
pub fn document() -> Result<Guarded<String>, Error> {
    let handler = Handler::with_params("document", ["doc_id"], |_, args| {
        format!("Document {}", args.get("doc_id").cloned().unwrap_or(Value::Null))
    })?;

    let shared = Require::with_args(
        ["doc_id"],
        |request, args| {
            let Some(doc_id) = args.get("doc_id") else {
                return false;
            };
            match request.session().fetch("docs") {
                Some(Value::Array(docs)) => docs.contains(doc_id),
                _ => false,
            }
        },
        RedirectTarget::up(),
    )?
    .with_flash("That document is not shared with you");

    shared.guard(handler)
}

/// An account area where every view needs a logged-in user.
///
/// The group gate redirects to `/login`; `settings` additionally needs
/// `confirmed` in the request values.
///
/// # Errors
///
/// Never fails for these fixed arguments.
pub fn account_group() -> Result<RouteGroup<String>, Error> {
    let mut group = RouteGroup::new("account");
    group.before_request(SessionRequire::new(["user_id"], "/login")?.with_flash("Please log in"));

    let anyone = Require::new(|_| true, "/");
    group.route(anyone.guard(Handler::new("profile", |request| {
        format!("Profile of {}", session_str(request, "user_id"))
    }))?);

    let confirmed = crate::ValueRequire::new(["confirmed"], RedirectTarget::up())?;
    group.route(confirmed.guard(Handler::new("settings", |_| "Settings saved".to_string()))?);

    Ok(group)
}
