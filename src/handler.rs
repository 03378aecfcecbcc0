//! Request handlers and requirement guards around them.

use std::fmt;
use std::sync::Arc;

use crate::args::{Args, CallArgs, Signature};
use crate::error::Error;
use crate::logging::GuardLog;
use crate::request::Request;
use crate::requirement::{Requirement, Verdict};
use crate::target::Redirect;

type Body<R> = dyn Fn(&dyn Request, &Args) -> R + Send + Sync;

/// A named request handler with a declared parameter list.
///
/// # Examples
///
/// ```
/// use request_guard::{CallArgs, Handler};
/// use request_guard::web::RequestAdapter;
///
/// let greet = Handler::with_params("greet", ["name"], |_, args| {
///     format!("Hello, {}", args.get("name").and_then(|v| v.as_str()).unwrap_or("?"))
/// })
/// .unwrap();
///
/// let adapter = RequestAdapter::new("req-1");
/// let body = greet.call(&adapter, CallArgs::new().arg("Ada")).unwrap();
/// assert_eq!(body, "Hello, Ada");
/// ```
pub struct Handler<R> {
    name: String,
    signature: Signature,
    body: Arc<Body<R>>,
}

impl<R> Handler<R> {
    /// A handler that takes no arguments.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&dyn Request) -> R + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Signature::empty(),
            body: Arc::new(move |request: &dyn Request, _: &Args| body(request)),
        }
    }

    /// A handler taking the named parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty or duplicated parameter names.
    pub fn with_params<I, S, F>(name: impl Into<String>, params: I, body: F) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn Request, &Args) -> R + Send + Sync + 'static,
    {
        Ok(Self {
            name: name.into(),
            signature: Signature::new(params)?,
            body: Arc::new(body),
        })
    }

    /// The handler's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler's declared parameters.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Binds `args` and runs the handler.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if `args` do not bind to the signature.
    pub fn call(&self, request: &dyn Request, args: CallArgs) -> Result<R, Error> {
        let bound = self.signature.bind(args)?;
        Ok((self.body)(request, &bound))
    }
}

impl<R> Clone for Handler<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            signature: self.signature.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<R> fmt::Debug for Handler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.signature.params())
            .finish()
    }
}

/// The outcome of calling a guarded handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<R> {
    /// Every guard passed and the handler ran.
    Handled(R),
    /// A guard failed; the handler did not run.
    Redirect(Redirect),
}

impl<R> Response<R> {
    /// Returns true for [`Response::Redirect`].
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// The redirect, if a guard failed.
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Redirect(redirect) => Some(redirect),
            Self::Handled(_) => None,
        }
    }

    /// The handler's output, if it ran.
    pub fn into_handled(self) -> Option<R> {
        match self {
            Self::Handled(output) => Some(output),
            Self::Redirect(_) => None,
        }
    }
}

/// A handler wrapped in one or more requirements.
///
/// Keeps the handler's name and signature. Guards run outermost first and
/// the first failing guard decides the redirect; guards inside it are not
/// evaluated.
///
/// # Examples
///
/// ```
/// use request_guard::{CallArgs, Handler, Require};
/// use request_guard::web::RequestAdapter;
///
/// let closed = Require::new(|_| false, "index");
/// let view = closed.guard(Handler::new("secret", |_| "Goodbye!")).unwrap();
///
/// let adapter = RequestAdapter::new("req-1").with_endpoint("index", "/");
/// let response = view.call(&adapter, CallArgs::new()).unwrap();
/// assert_eq!(response.redirect().unwrap().location(), "/");
/// ```
pub struct Guarded<R> {
    handler: Handler<R>,
    guards: Vec<Requirement>,
}

impl<R> Guarded<R> {
    /// Wraps `handler` with no guards yet.
    pub fn new(handler: Handler<R>) -> Self {
        Self {
            handler,
            guards: Vec::new(),
        }
    }

    /// Adds `requirement` as the new outermost guard.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if the requirement needs an argument the
    /// handler does not declare.
    pub fn require(mut self, requirement: &Requirement) -> Result<Self, Error> {
        let signature = self.handler.signature();
        if let Some(missing) = requirement
            .required_args()
            .iter()
            .find(|name| !signature.accepts(name))
        {
            return Err(Error::argument_binding(format!(
                "handler '{}' does not take argument '{}' needed by its requirement",
                self.handler.name(),
                missing
            )));
        }
        self.guards.insert(0, requirement.clone());
        Ok(self)
    }

    /// The wrapped handler's name.
    pub fn name(&self) -> &str {
        self.handler.name()
    }

    /// The wrapped handler's declared parameters.
    pub fn signature(&self) -> &Signature {
        self.handler.signature()
    }

    /// Guards in evaluation order, outermost first.
    pub fn guards(&self) -> &[Requirement] {
        &self.guards
    }

    /// Binds `args`, evaluates the guards, and runs the handler or redirects.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if `args` do not bind to the signature and
    /// `UnknownEndpoint` if a failing guard's target cannot be resolved.
    pub fn call(&self, request: &dyn Request, args: CallArgs) -> Result<Response<R>, Error> {
        let bound = self.handler.signature.bind(args)?;
        let log = GuardLog::new(request.request_id());

        for guard in &self.guards {
            if let Verdict::Fail(failure) = guard.evaluate(request, &bound)? {
                let redirect = failure.respond(request, &log, self.name())?;
                return Ok(Response::Redirect(redirect));
            }
        }

        log.passed(self.name());
        Ok(Response::Handled((self.handler.body)(request, &bound)))
    }
}

impl<R> Clone for Guarded<R> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            guards: self.guards.clone(),
        }
    }
}

impl<R> fmt::Debug for Guarded<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("handler", &self.handler)
            .field("guards", &self.guards)
            .finish()
    }
}

impl Requirement {
    /// Wraps `handler` so it only runs when this requirement passes.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentBinding` if this requirement needs an argument the
    /// handler does not declare. The check happens here, before any request
    /// is served.
    pub fn guard<R>(&self, handler: Handler<R>) -> Result<Guarded<R>, Error> {
        Guarded::new(handler).require(self)
    }
}
