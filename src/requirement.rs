//! The requirement handle and its evaluation protocol.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::compound::Compound;
use crate::error::{Error, ErrorKind};
use crate::function::FunctionCheck;
use crate::keycheck::KeyCheck;
use crate::logging::GuardLog;
use crate::request::Request;
use crate::target::{Redirect, RedirectTarget};

/// Flash category used when a requirement does not set one.
pub const DEFAULT_CATEGORY: &str = "warning";

static NO_ARGS: BTreeSet<String> = BTreeSet::new();

/// A guard predicate plus what to do when it fails.
///
/// Requirements are built once, typically when routes are registered, and
/// are immutable afterwards. Cloning is cheap and clones share the same
/// tree, so one requirement can guard any number of handlers and be
/// evaluated from many threads at once.
///
/// Build leaves with [`Require`](crate::Require),
/// [`SessionRequire`](crate::SessionRequire),
/// [`ValueRequire`](crate::ValueRequire) or
/// [`ContextRequire`](crate::ContextRequire), and combine them with `&`
/// and `|` or with [`AllRequire`](crate::AllRequire) and
/// [`AnyRequire`](crate::AnyRequire).
///
/// # Examples
///
/// ```
/// use request_guard::{Args, Require, SessionRequire};
/// use request_guard::web::RequestAdapter;
///
/// let logged_in = SessionRequire::new(["user_id"], "login")
///     .unwrap()
///     .with_flash("Please log in");
/// let open = Require::new(|_| true, "index");
/// let either = &logged_in | &open;
///
/// let adapter = RequestAdapter::new("req-1");
/// assert!(!logged_in.check(&adapter, &Args::new()).unwrap());
/// assert!(either.check(&adapter, &Args::new()).unwrap());
/// ```
#[derive(Clone)]
pub struct Requirement {
    node: Arc<Node>,
}

#[derive(Clone)]
pub(crate) enum Node {
    Leaf(Leaf),
    Compound(Compound),
}

#[derive(Clone)]
pub(crate) struct Leaf {
    pub(crate) check: LeafCheck,
    pub(crate) target: RedirectTarget,
    pub(crate) message: Option<String>,
    pub(crate) category: String,
}

#[derive(Clone)]
pub(crate) enum LeafCheck {
    Function(FunctionCheck),
    Keys(KeyCheck),
}

/// What a requirement tree decided for one request.
#[derive(Debug, Clone, Copy)]
pub enum Verdict<'a> {
    /// Every needed check passed.
    Pass,
    /// The requirement failed; carries the failure to report.
    Fail(Failure<'a>),
}

impl Verdict<'_> {
    /// Returns true for [`Verdict::Pass`].
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// The message, category and target reported by a failed requirement.
///
/// For compound requirements these come from the member that decided the
/// failure, with any values set on the compound taking priority.
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a> {
    pub(crate) message: Option<&'a str>,
    pub(crate) category: Option<&'a str>,
    pub(crate) target: &'a RedirectTarget,
}

impl<'a> Failure<'a> {
    /// The flash message, if any.
    pub fn message(&self) -> Option<&'a str> {
        self.message
    }

    /// The flash category, if any.
    pub fn category(&self) -> Option<&'a str> {
        self.category
    }

    /// Where the client is sent.
    pub fn target(&self) -> &'a RedirectTarget {
        self.target
    }

    /// Flashes the message (if any) and builds the redirect.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` if the target cannot be resolved. Nothing
    /// is flashed in that case.
    pub(crate) fn respond(
        &self,
        request: &dyn Request,
        log: &GuardLog<'_>,
        scope: &str,
    ) -> Result<Redirect, Error> {
        let location = self.target.resolve(request)?;
        let category = self.category.unwrap_or(DEFAULT_CATEGORY);
        if let Some(message) = self.message {
            request.flash(message, category);
        }
        log.redirected(scope, &location, self.message.map(|_| category));
        Ok(Redirect::to(location))
    }
}

/// The shape of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    /// A predicate function.
    Function,
    /// Key checks against the session.
    Session,
    /// Key checks against query-string and form values.
    Values,
    /// Key checks against the per-request context.
    Context,
    /// Conjunction of members.
    All,
    /// Disjunction of members.
    Any,
}

impl Requirement {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        Arc::make_mut(&mut self.node)
    }

    /// Returns the shape of this requirement.
    pub fn kind(&self) -> RequirementKind {
        match self.node() {
            Node::Leaf(leaf) => match &leaf.check {
                LeafCheck::Function(_) => RequirementKind::Function,
                LeafCheck::Keys(keys) => keys.kind(),
            },
            Node::Compound(compound) => compound.kind(),
        }
    }

    /// The member requirements of a compound, empty for leaves.
    pub fn members(&self) -> &[Requirement] {
        match self.node() {
            Node::Leaf(_) => &[],
            Node::Compound(compound) => &compound.members,
        }
    }

    /// Handler argument names the checks consume.
    pub fn required_args(&self) -> &BTreeSet<String> {
        match self.node() {
            Node::Leaf(Leaf {
                check: LeafCheck::Function(function),
                ..
            }) => function.required_args(),
            Node::Leaf(_) => &NO_ARGS,
            Node::Compound(compound) => &compound.required_args,
        }
    }

    /// The flash message set on this requirement.
    pub fn flash_message(&self) -> Option<&str> {
        match self.node() {
            Node::Leaf(leaf) => leaf.message.as_deref(),
            Node::Compound(compound) => compound.message.as_deref(),
        }
    }

    /// The flash category set on this requirement.
    ///
    /// Leaves always have one. Compounds only when it was set explicitly.
    pub fn flash_category(&self) -> Option<&str> {
        match self.node() {
            Node::Leaf(leaf) => Some(&leaf.category),
            Node::Compound(compound) => compound.category.as_deref(),
        }
    }

    /// The redirect target set on this requirement.
    ///
    /// Leaves always have one. Compounds only when it was set explicitly.
    pub fn redirect_target(&self) -> Option<&RedirectTarget> {
        match self.node() {
            Node::Leaf(leaf) => Some(&leaf.target),
            Node::Compound(compound) => compound.target.as_ref(),
        }
    }

    /// Sets the message flashed when this requirement fails.
    pub fn with_flash(mut self, message: impl Into<String>) -> Self {
        let message = Some(message.into());
        match self.node_mut() {
            Node::Leaf(leaf) => leaf.message = message,
            Node::Compound(compound) => compound.message = message,
        }
        self
    }

    /// Sets the category of the flashed message.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        match self.node_mut() {
            Node::Leaf(leaf) => leaf.category = category,
            Node::Compound(compound) => compound.category = Some(category),
        }
        self
    }

    /// Sets where the client is sent when this requirement fails.
    pub fn redirect_to(mut self, target: impl Into<RedirectTarget>) -> Self {
        let target = target.into();
        match self.node_mut() {
            Node::Leaf(leaf) => leaf.target = target,
            Node::Compound(compound) => compound.target = Some(target),
        }
        self
    }

    /// Returns true if both handles share the same requirement.
    pub fn ptr_eq(&self, other: &Requirement) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Evaluates the requirement tree.
    ///
    /// `args` are the handler's bound arguments; function requirements read
    /// the names they declared from it. Evaluation has no side effects on
    /// the request beyond what caller-supplied predicates do.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if a function requirement's arguments are
    /// missing from `args`.
    pub fn evaluate<'a>(
        &'a self,
        request: &dyn Request,
        args: &Args,
    ) -> Result<Verdict<'a>, Error> {
        match self.node() {
            Node::Leaf(leaf) => {
                let passed = match &leaf.check {
                    LeafCheck::Function(function) => function.evaluate(request, args)?,
                    LeafCheck::Keys(keys) => keys.evaluate(request),
                };
                if passed {
                    Ok(Verdict::Pass)
                } else {
                    Ok(Verdict::Fail(Failure {
                        message: leaf.message.as_deref(),
                        category: Some(&leaf.category),
                        target: &leaf.target,
                    }))
                }
            }
            Node::Compound(compound) => compound.evaluate(request, args),
        }
    }

    /// Runs the requirement as a before-request gate.
    ///
    /// Returns `None` when the requirement passes and the redirect to send
    /// when it fails. The failure's message, if any, is flashed first.
    ///
    /// # Errors
    ///
    /// Returns `Usage` if the requirement needs handler arguments, and
    /// `UnknownEndpoint` if the redirect target cannot be resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use request_guard::Require;
    /// use request_guard::web::RequestAdapter;
    ///
    /// let closed = Require::new(|_| false, "index");
    /// let adapter = RequestAdapter::new("req-1").with_endpoint("index", "/");
    ///
    /// let redirect = closed.call(&adapter).unwrap().expect("redirects");
    /// assert_eq!(redirect.location(), "/");
    /// ```
    pub fn call(&self, request: &dyn Request) -> Result<Option<Redirect>, Error> {
        self.call_in(request, "before_request")
    }

    pub(crate) fn call_in(
        &self,
        request: &dyn Request,
        scope: &str,
    ) -> Result<Option<Redirect>, Error> {
        let required = self.required_args();
        if !required.is_empty() {
            let names: Vec<&str> = required.iter().map(String::as_str).collect();
            return Err(Error::new(
                ErrorKind::Usage,
                format!(
                    "requirement takes arguments ({}) and can't be used directly",
                    names.join(", ")
                ),
            ));
        }

        let log = GuardLog::new(request.request_id());
        match self.evaluate(request, &Args::new())? {
            Verdict::Pass => {
                log.passed(scope);
                Ok(None)
            }
            Verdict::Fail(failure) => failure.respond(request, &log, scope).map(Some),
        }
    }

    /// Evaluates the requirement with explicit arguments and returns only
    /// whether it passed. Nothing is flashed.
    ///
    /// Names in `args` that no check needs are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if a required argument is missing.
    pub fn check(&self, request: &dyn Request, args: &Args) -> Result<bool, Error> {
        Ok(self.evaluate(request, args)?.passed())
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Requirement");
        s.field("kind", &self.kind());
        if !self.members().is_empty() {
            s.field("members", &self.members());
        }
        if !self.required_args().is_empty() {
            s.field("required_args", self.required_args());
        }
        s.field("target", &self.redirect_target())
            .field("message", &self.flash_message())
            .field("category", &self.flash_category())
            .finish()
    }
}
