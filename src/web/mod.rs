//! Web framework integration surface.
//!
//! This module holds the pieces a host application wires requirements into:
//! - [`RequestAdapter`], an owned in-memory [`Request`](crate::Request)
//!   that records flashes and resolves registered endpoints
//! - [`RouteGroup`], views sharing before-request requirements
//! - [`example_handler`], guarded views showing typical setups
//!
//! The module contains no framework-specific code. A framework binding
//! implements [`Request`](crate::Request) on its own request type (or
//! builds a `RequestAdapter` per request), calls the guarded view, and
//! turns a [`Redirect`](crate::Redirect) into its own 302 response.
//!
//! # Example Flow
//!
//! ```
//! use request_guard::{CallArgs, Handler, Response, SessionRequire};
//! use request_guard::web::RequestAdapter;
//!
//! let view = SessionRequire::new(["user_id"], "login")
//!     .unwrap()
//!     .with_flash("Please log in")
//!     .guard(Handler::new("home", |_| "home page"))
//!     .unwrap();
//!
//! let adapter = RequestAdapter::new("req-1").with_endpoint("login", "/login");
//! match view.call(&adapter, CallArgs::new()).unwrap() {
//!     Response::Handled(body) => println!("200 {}", body),
//!     Response::Redirect(r) => println!("{} -> {}", r.status(), r.location()),
//! }
//! assert_eq!(adapter.take_flashes()[0].message, "Please log in");
//! ```

mod adapter;
pub mod example_handler;
mod group;

pub use adapter::{FlashMessage, RequestAdapter};
pub use group::RouteGroup;
