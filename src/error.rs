use std::fmt;

/// Errors raised while building, applying, or directly invoking requirements.
///
/// Every error carries an [`ErrorKind`] and a human-readable message.
/// Construction and guard-application failures surface before any request
/// is served; binding and endpoint failures surface from the call that
/// triggered them. Predicate panics are never caught.
///
/// # Examples
///
/// ```
/// use request_guard::{Error, ErrorKind};
///
/// let error = Error::new(ErrorKind::InvalidArgument, "needs must not be empty");
/// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
/// assert_eq!(error.to_string(), "invalid argument: needs must not be empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Creates a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub(crate) fn argument_binding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentBinding, message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

/// The kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed constructor input (bad timestamp age, empty needs, empty
    /// key, empty compound, invalid argument manifest).
    InvalidArgument,
    /// Required argument names are not declared by the guarded handler, or
    /// call arguments do not bind to a signature.
    ArgumentBinding,
    /// A requirement that needs handler arguments was invoked directly.
    Usage,
    /// A redirect endpoint name could not be resolved to a URL.
    UnknownEndpoint,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::ArgumentBinding => write!(f, "argument binding"),
            Self::Usage => write!(f, "usage"),
            Self::UnknownEndpoint => write!(f, "unknown endpoint"),
        }
    }
}
