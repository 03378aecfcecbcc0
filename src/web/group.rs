//! Route groups with shared before-request requirements.

use std::collections::BTreeMap;

use crate::args::CallArgs;
use crate::error::{Error, ErrorKind};
use crate::handler::{Guarded, Response};
use crate::request::Request;
use crate::requirement::Requirement;

/// A set of views sharing before-request requirements.
///
/// Before-request requirements run in registration order ahead of the
/// view's own guards. The first one that fails redirects and no view runs.
///
/// # Examples
///
/// ```
/// use request_guard::{CallArgs, Handler, Require, SessionRequire};
/// use request_guard::web::{RequestAdapter, RouteGroup};
///
/// let mut account = RouteGroup::new("account");
/// account.before_request(SessionRequire::new(["user_id"], "/login").unwrap());
/// account.route(Require::new(|_| true, "/").guard(Handler::new("profile", |_| "profile")).unwrap());
///
/// let anonymous = RequestAdapter::new("req-1");
/// let response = account.dispatch(&anonymous, "profile", CallArgs::new()).unwrap();
/// assert_eq!(response.redirect().unwrap().location(), "/login");
/// ```
#[derive(Debug)]
pub struct RouteGroup<R> {
    name: String,
    before: Vec<Requirement>,
    views: BTreeMap<String, Guarded<R>>,
}

impl<R> RouteGroup<R> {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: Vec::new(),
            views: BTreeMap::new(),
        }
    }

    /// The group's name, used as the logging scope of its gates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a requirement checked before every view in the group.
    pub fn before_request(&mut self, requirement: Requirement) -> &mut Self {
        self.before.push(requirement);
        self
    }

    /// Registers a view under its handler name, replacing any earlier one.
    pub fn route(&mut self, view: Guarded<R>) -> &mut Self {
        self.views.insert(view.name().to_string(), view);
        self
    }

    /// The view registered as `name`.
    pub fn view(&self, name: &str) -> Option<&Guarded<R>> {
        self.views.get(name)
    }

    /// Runs the group gates, then the named view.
    ///
    /// # Errors
    ///
    /// - `UnknownEndpoint` if no view is registered as `view`, or a failing
    ///   requirement's endpoint cannot be resolved.
    /// - `Usage` if a before-request requirement needs handler arguments.
    /// - `ArgumentBinding` if `args` do not bind to the view.
    pub fn dispatch(
        &self,
        request: &dyn Request,
        view: &str,
        args: CallArgs,
    ) -> Result<Response<R>, Error> {
        let target = self.views.get(view).ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownEndpoint,
                format!("no view '{}' in group '{}'", view, self.name),
            )
        })?;

        for gate in &self.before {
            if let Some(redirect) = gate.call_in(request, &self.name)? {
                return Ok(Response::Redirect(redirect));
            }
        }

        target.call(request, args)
    }
}
