//! Requirements backed by an arbitrary predicate.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::args::{validate_names, Args};
use crate::error::Error;
use crate::request::Request;
use crate::requirement::{Leaf, LeafCheck, Node, Requirement, DEFAULT_CATEGORY};
use crate::target::RedirectTarget;

type Predicate = dyn Fn(&dyn Request, &Args) -> bool + Send + Sync;

#[derive(Clone)]
pub(crate) struct FunctionCheck {
    predicate: Arc<Predicate>,
    required_args: BTreeSet<String>,
}

impl FunctionCheck {
    pub(crate) fn required_args(&self) -> &BTreeSet<String> {
        &self.required_args
    }

    /// Calls the predicate with exactly the declared arguments.
    pub(crate) fn evaluate(&self, request: &dyn Request, args: &Args) -> Result<bool, Error> {
        let projected = args.project(&self.required_args)?;
        Ok((self.predicate)(request, &projected))
    }
}

/// Builds requirements that call a predicate.
///
/// Predicates receive the current request and, for [`Require::with_args`],
/// the handler arguments they declared. The declared names must be
/// parameters of every handler the requirement guards; this is checked
/// when the guard is applied.
///
/// # Examples
///
/// ```
/// use request_guard::{Args, Require};
/// use request_guard::web::RequestAdapter;
///
/// let larger = Require::with_args(
///     ["first", "second"],
///     |_, args| args.get("first").and_then(|v| v.as_i64()) > args.get("second").and_then(|v| v.as_i64()),
///     "index",
/// )
/// .unwrap();
///
/// let adapter = RequestAdapter::new("req-1");
/// let args = Args::new().with("first", 2).with("second", 1);
/// assert!(larger.check(&adapter, &args).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Require;

impl Require {
    /// A requirement whose predicate needs no handler arguments.
    pub fn new<F>(predicate: F, target: impl Into<RedirectTarget>) -> Requirement
    where
        F: Fn(&dyn Request) -> bool + Send + Sync + 'static,
    {
        build(
            Arc::new(move |request: &dyn Request, _: &Args| predicate(request)),
            BTreeSet::new(),
            target.into(),
        )
    }

    /// A requirement whose predicate reads the named handler arguments.
    ///
    /// The predicate sees only the names listed here, whatever else the
    /// handler is called with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty or duplicated names.
    pub fn with_args<I, S, F>(
        names: I,
        predicate: F,
        target: impl Into<RedirectTarget>,
    ) -> Result<Requirement, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn Request, &Args) -> bool + Send + Sync + 'static,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        validate_names(&names)?;
        Ok(build(
            Arc::new(predicate),
            names.into_iter().collect(),
            target.into(),
        ))
    }
}

fn build(
    predicate: Arc<Predicate>,
    required_args: BTreeSet<String>,
    target: RedirectTarget,
) -> Requirement {
    Requirement::from_node(Node::Leaf(Leaf {
        check: LeafCheck::Function(FunctionCheck {
            predicate,
            required_args,
        }),
        target,
        message: None,
        category: DEFAULT_CATEGORY.to_string(),
    }))
}
