//! Redirect targets and the redirect response.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, ErrorKind};
use crate::request::Request;

/// HTTP status used for requirement redirects.
pub const REDIRECT_STATUS: u16 = 302;

type TargetFn = dyn Fn(&dyn Request) -> String + Send + Sync;

/// Where to send the client when a requirement fails.
///
/// Strings are classified once, when converted:
/// - a leading `/` is an absolute path,
/// - `http:` or `https:` is a full URL,
/// - anything else names an endpoint resolved through [`Request::url_for`].
///
/// # Examples
///
/// ```
/// use request_guard::RedirectTarget;
///
/// assert!(matches!(RedirectTarget::from("/login"), RedirectTarget::Path(_)));
/// assert!(matches!(RedirectTarget::from("https://example.com"), RedirectTarget::Url(_)));
/// assert!(matches!(RedirectTarget::from("index"), RedirectTarget::Endpoint(_)));
/// ```
#[derive(Clone)]
pub enum RedirectTarget {
    /// Computes the destination from the current request.
    Callable(Arc<TargetFn>),
    /// An absolute path, used as-is.
    Path(String),
    /// A full URL, used as-is.
    Url(String),
    /// A named endpoint.
    Endpoint(String),
}

impl RedirectTarget {
    /// Classifies a destination string.
    pub fn parse(target: impl Into<String>) -> Self {
        let target = target.into();
        if target.starts_with('/') {
            Self::Path(target)
        } else if is_http_url(&target) {
            Self::Url(target)
        } else {
            Self::Endpoint(target)
        }
    }

    /// A target computed from the request at redirect time.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&dyn Request) -> String + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }

    /// A target pointing one level up from the current path. See [`up`].
    pub fn up() -> Self {
        Self::from_fn(up)
    }

    /// Resolves the destination location for `request`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` if an endpoint name cannot be resolved.
    pub fn resolve(&self, request: &dyn Request) -> Result<String, Error> {
        match self {
            Self::Callable(f) => Ok(f(request)),
            Self::Path(location) | Self::Url(location) => Ok(location.clone()),
            Self::Endpoint(name) => request.url_for(name).ok_or_else(|| {
                Error::new(
                    ErrorKind::UnknownEndpoint,
                    format!("no URL for endpoint '{}'", name),
                )
            }),
        }
    }
}

fn is_http_url(target: &str) -> bool {
    target.starts_with("http:") || target.starts_with("https:")
}

impl From<&str> for RedirectTarget {
    fn from(target: &str) -> Self {
        Self::parse(target)
    }
}

impl From<String> for RedirectTarget {
    fn from(target: String) -> Self {
        Self::parse(target)
    }
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Url(u) => f.debug_tuple("Url").field(u).finish(),
            Self::Endpoint(e) => f.debug_tuple("Endpoint").field(e).finish(),
        }
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("<callable>"),
            Self::Path(s) | Self::Url(s) | Self::Endpoint(s) => f.write_str(s),
        }
    }
}

/// Returns the URL of the node one level above the current request path.
///
/// `/a/b/c` and `/a/b/c/` both lead to `/a/b/`, prefixed with the
/// application's root path.
///
/// # Examples
///
/// ```
/// use request_guard::up;
/// use request_guard::web::RequestAdapter;
///
/// let adapter = RequestAdapter::new("req-1").with_path("/docs/guide/intro");
/// assert_eq!(up(&adapter), "/docs/guide/");
/// ```
pub fn up(request: &dyn Request) -> String {
    let path = request.path();
    // Ignore a trailing slash so `/a/b/` goes to `/a/`.
    let search = match path.char_indices().last() {
        Some((i, _)) => &path[..i],
        None => path,
    };
    let parent = match search.rfind('/') {
        Some(i) => &path[..=i],
        None => path,
    };
    format!("{}{}", request.root_path(), parent)
}

/// A redirect produced by a failed requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
}

impl Redirect {
    /// Creates a redirect to `location`.
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// The destination sent in the `Location` header.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The HTTP status code of the redirect.
    pub fn status(&self) -> u16 {
        REDIRECT_STATUS
    }
}
