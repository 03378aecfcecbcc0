//! Declarative access requirements for web request handlers.
//!
//! A [`Requirement`] pairs a predicate over the current request with a
//! redirect target and an optional flash message. Wrapping a handler in a
//! requirement produces a guarded view that only runs when the predicate
//! holds; otherwise the client is redirected and the message is flashed.
//!
//! # Core Types
//!
//! - [`Require`]: requirement backed by a predicate, optionally reading
//!   named handler arguments
//! - [`SessionRequire`], [`ValueRequire`], [`ContextRequire`]: key checks
//!   against the session, request values, or per-request context
//! - [`AllRequire`], [`AnyRequire`]: conjunction and disjunction, also
//!   built with `&` and `|`
//! - [`TimestampAge`], [`Contains`], [`MatchContext`]: reusable value checks
//! - [`Guarded`]: a [`Handler`] wrapped in requirements
//! - [`Request`]: the host boundary every evaluation reads from
//!
//! # Examples
//!
//! ```
//! use request_guard::{CallArgs, Handler, Require, SessionRequire};
//! use request_guard::web::RequestAdapter;
//!
//! let logged_in = SessionRequire::new(["user_id"], "login")
//!     .unwrap()
//!     .with_flash("Please log in");
//! let not_banned = Require::new(|req| !req.session().contains("banned"), "/");
//!
//! let view = (&logged_in & &not_banned)
//!     .guard(Handler::new("home", |_| "Welcome"))
//!     .unwrap();
//!
//! let adapter = RequestAdapter::new("req-123").with_endpoint("login", "/login");
//! let response = view.call(&adapter, CallArgs::new()).unwrap();
//! assert_eq!(response.redirect().unwrap().location(), "/login");
//! assert_eq!(adapter.flashes()[0].message, "Please log in");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod args;
mod checks;
mod compound;
mod error;
mod function;
mod handler;
mod keycheck;
mod logging;
mod request;
mod requirement;
mod target;

pub mod web;

pub use args::{Args, CallArgs, Signature};
pub use checks::{Clock, Contains, FixedClock, MatchContext, SystemClock, TimestampAge, ValueCheck};
pub use compound::{AllRequire, AnyRequire};
pub use error::{Error, ErrorKind};
pub use function::Require;
pub use handler::{Guarded, Handler, Response};
pub use keycheck::{Acceptor, ContextRequire, Need, SessionRequire, ValueRequire};
pub use request::{KeyStore, MapStore, Request, StoreKind};
pub use requirement::{Failure, Requirement, RequirementKind, Verdict, DEFAULT_CATEGORY};
pub use target::{up, Redirect, RedirectTarget, REDIRECT_STATUS};
