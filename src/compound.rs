//! Conjunctions and disjunctions of requirements.
//!
//! Members are evaluated left to right and evaluation stops as soon as the
//! outcome is known. The failure reported is the first member failure
//! encountered, with any message, category or target set on the compound
//! itself taking priority.
//!
//! Chaining the same operator keeps the tree flat: `(a & b) & c` is one
//! three-member conjunction, while `(a & b) | c` is a disjunction whose first
//! member is the conjunction `a & b`.

use std::collections::BTreeSet;
use std::ops::{BitAnd, BitOr};

use crate::args::Args;
use crate::error::Error;
use crate::request::Request;
use crate::requirement::{Failure, Node, Requirement, RequirementKind, Verdict};
use crate::target::RedirectTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    All,
    Any,
}

#[derive(Clone)]
pub(crate) struct Compound {
    pub(crate) mode: Mode,
    pub(crate) members: Vec<Requirement>,
    pub(crate) required_args: BTreeSet<String>,
    pub(crate) target: Option<RedirectTarget>,
    pub(crate) message: Option<String>,
    pub(crate) category: Option<String>,
}

impl Compound {
    fn new(mode: Mode, members: Vec<Requirement>) -> Result<Self, Error> {
        if members.is_empty() {
            return Err(Error::invalid_argument(
                "compound requirement needs at least one member",
            ));
        }
        let required_args = members
            .iter()
            .flat_map(|m| m.required_args().iter().cloned())
            .collect();
        Ok(Self {
            mode,
            members,
            required_args,
            target: None,
            message: None,
            category: None,
        })
    }

    pub(crate) fn kind(&self) -> RequirementKind {
        match self.mode {
            Mode::All => RequirementKind::All,
            Mode::Any => RequirementKind::Any,
        }
    }

    fn has_overrides(&self) -> bool {
        self.target.is_some() || self.message.is_some() || self.category.is_some()
    }

    fn with_overrides<'a>(&'a self, failure: Failure<'a>) -> Failure<'a> {
        Failure {
            message: self.message.as_deref().or(failure.message),
            category: self.category.as_deref().or(failure.category),
            target: self.target.as_ref().unwrap_or(failure.target),
        }
    }

    pub(crate) fn evaluate<'a>(
        &'a self,
        request: &dyn Request,
        args: &Args,
    ) -> Result<Verdict<'a>, Error> {
        match self.mode {
            Mode::All => {
                for member in &self.members {
                    if let Verdict::Fail(failure) = member.evaluate(request, args)? {
                        return Ok(Verdict::Fail(self.with_overrides(failure)));
                    }
                }
                Ok(Verdict::Pass)
            }
            Mode::Any => {
                let mut first_failure = None;
                for member in &self.members {
                    match member.evaluate(request, args)? {
                        Verdict::Pass => return Ok(Verdict::Pass),
                        Verdict::Fail(failure) => {
                            first_failure.get_or_insert(failure);
                        }
                    }
                }
                Ok(first_failure.map_or(Verdict::Pass, |failure| {
                    Verdict::Fail(self.with_overrides(failure))
                }))
            }
        }
    }
}

/// Builds conjunctions: passes only if every member passes.
///
/// # Examples
///
/// ```
/// use request_guard::{AllRequire, SessionRequire};
///
/// let a = SessionRequire::new([("a", "A")], "index").unwrap();
/// let b = SessionRequire::new([("b", "B")], "index").unwrap();
///
/// let both = AllRequire::new([a, b])
///     .unwrap()
///     .redirect_to("/login")
///     .with_flash("Both a and b are needed");
/// assert_eq!(both.members().len(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AllRequire;

impl AllRequire {
    /// A conjunction of `members`, evaluated left to right.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `members` is empty.
    pub fn new(members: impl IntoIterator<Item = Requirement>) -> Result<Requirement, Error> {
        compound(Mode::All, members.into_iter().collect())
    }
}

/// Builds disjunctions: passes if any member passes.
#[derive(Debug, Clone, Copy)]
pub struct AnyRequire;

impl AnyRequire {
    /// A disjunction of `members`, evaluated left to right.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `members` is empty.
    pub fn new(members: impl IntoIterator<Item = Requirement>) -> Result<Requirement, Error> {
        compound(Mode::Any, members.into_iter().collect())
    }
}

fn compound(mode: Mode, members: Vec<Requirement>) -> Result<Requirement, Error> {
    Ok(Requirement::from_node(Node::Compound(Compound::new(
        mode, members,
    )?)))
}

/// Members of `req` when it is an override-free compound of `mode`.
fn flattenable(req: &Requirement, mode: Mode) -> Option<&[Requirement]> {
    match req.node() {
        Node::Compound(c) if c.mode == mode && !c.has_overrides() => Some(&c.members),
        _ => None,
    }
}

/// Combines two requirements, flattening a same-mode left operand.
///
/// A left operand carrying its own message, category or target is kept
/// as a nested member so its overrides still apply.
fn combine(mode: Mode, left: &Requirement, right: &Requirement) -> Requirement {
    let members = match flattenable(left, mode) {
        Some(left_members) => {
            let mut members = left_members.to_vec();
            match flattenable(right, mode) {
                Some(right_members) => members.extend_from_slice(right_members),
                None => members.push(right.clone()),
            }
            members
        }
        None => vec![left.clone(), right.clone()],
    };
    let required_args = members
        .iter()
        .flat_map(|m| m.required_args().iter().cloned())
        .collect();
    Requirement::from_node(Node::Compound(Compound {
        mode,
        members,
        required_args,
        target: None,
        message: None,
        category: None,
    }))
}

impl Requirement {
    /// Both `self` and `other` must pass. Same as `self & other`.
    pub fn and(&self, other: &Requirement) -> Requirement {
        combine(Mode::All, self, other)
    }

    /// Either `self` or `other` must pass. Same as `self | other`.
    pub fn or(&self, other: &Requirement) -> Requirement {
        combine(Mode::Any, self, other)
    }
}

impl BitAnd for Requirement {
    type Output = Requirement;

    fn bitand(self, rhs: Requirement) -> Requirement {
        self.and(&rhs)
    }
}

impl BitAnd for &Requirement {
    type Output = Requirement;

    fn bitand(self, rhs: Self) -> Requirement {
        self.and(rhs)
    }
}

impl BitOr for Requirement {
    type Output = Requirement;

    fn bitor(self, rhs: Requirement) -> Requirement {
        self.or(&rhs)
    }
}

impl BitOr for &Requirement {
    type Output = Requirement;

    fn bitor(self, rhs: Self) -> Requirement {
        self.or(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::web::RequestAdapter;
    use crate::{Require, SessionRequire};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn session_eq(key: &str, value: &str) -> Requirement {
        SessionRequire::new([(key, value)], "index")
            .unwrap()
            .with_flash(format!("Fail {}", value))
    }

    fn counting(result: bool, calls: &Arc<AtomicUsize>) -> Requirement {
        let counter = Arc::clone(calls);
        Require::new(
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                result
            },
            "index",
        )
    }

    fn fail_message(req: &Requirement, adapter: &RequestAdapter) -> Option<String> {
        match req.evaluate(adapter, &Args::new()).unwrap() {
            Verdict::Pass => None,
            Verdict::Fail(f) => f.message().map(str::to_string),
        }
    }

    #[test]
    fn empty_compounds_are_rejected() {
        let err = AllRequire::new(Vec::<Requirement>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = AnyRequire::new(Vec::<Requirement>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn all_reports_first_failure() {
        let req = session_eq("a", "A") & session_eq("b", "B");

        let adapter = RequestAdapter::new("r");
        assert_eq!(fail_message(&req, &adapter).as_deref(), Some("Fail A"));

        adapter.session_store().insert("a", "A");
        assert_eq!(fail_message(&req, &adapter).as_deref(), Some("Fail B"));

        adapter.session_store().insert("b", "B");
        assert!(req.check(&adapter, &Args::new()).unwrap());
    }

    #[test]
    fn any_reports_first_member_failure() {
        let req = session_eq("a", "A") | session_eq("b", "B");

        let adapter = RequestAdapter::new("r");
        assert_eq!(fail_message(&req, &adapter).as_deref(), Some("Fail A"));

        adapter.session_store().insert("b", "B");
        assert!(req.check(&adapter, &Args::new()).unwrap());
    }

    #[test]
    fn any_short_circuits_on_first_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Require::new(|_| true, "index") | counting(true, &calls);

        assert!(req.check(&RequestAdapter::new("r"), &Args::new()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_short_circuits_on_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Require::new(|_| false, "index") & counting(true, &calls);

        assert!(!req.check(&RequestAdapter::new("r"), &Args::new()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn compound_overrides_win() {
        let a = session_eq("a", "A").with_category("error").redirect_to("/a");
        let b = session_eq("b", "B").with_category("error").redirect_to("/b");

        for req in [
            AllRequire::new([a.clone(), b.clone()]).unwrap(),
            AnyRequire::new([a.clone(), b.clone()]).unwrap(),
        ] {
            let req = req
                .redirect_to("dump")
                .with_flash("OVERRIDE")
                .with_category("warning");
            match req.evaluate(&RequestAdapter::new("r"), &Args::new()).unwrap() {
                Verdict::Fail(f) => {
                    assert_eq!(f.message(), Some("OVERRIDE"));
                    assert_eq!(f.category(), Some("warning"));
                    assert!(matches!(f.target(), RedirectTarget::Endpoint(e) if e == "dump"));
                }
                Verdict::Pass => panic!("{:?} should fail on an empty session", req.kind()),
            }
        }
    }

    #[test]
    fn unset_overrides_propagate_member_values() {
        let a = session_eq("a", "A").with_category("error").redirect_to("/a");
        let req = AllRequire::new([a]).unwrap();

        match req.evaluate(&RequestAdapter::new("r"), &Args::new()).unwrap() {
            Verdict::Fail(f) => {
                assert_eq!(f.message(), Some("Fail A"));
                assert_eq!(f.category(), Some("error"));
                assert!(matches!(f.target(), RedirectTarget::Path(p) if p == "/a"));
            }
            Verdict::Pass => panic!("should fail"),
        }
    }

    #[test]
    fn chained_and_flattens() {
        let (a, b, c) = (session_eq("a", "A"), session_eq("b", "B"), session_eq("c", "C"));
        let chained = &(&a & &b) & &c;

        assert_eq!(chained.kind(), RequirementKind::All);
        let members = chained.members();
        assert_eq!(members.len(), 3);
        assert!(members[0].ptr_eq(&a));
        assert!(members[1].ptr_eq(&b));
        assert!(members[2].ptr_eq(&c));
    }

    #[test]
    fn same_mode_right_operand_is_spliced_after_flat_left() {
        let (a, b, c, d) = (
            session_eq("a", "A"),
            session_eq("b", "B"),
            session_eq("c", "C"),
            session_eq("d", "D"),
        );
        let req = (&a | &b) | (&c | &d);
        assert_eq!(req.members().len(), 4);
        assert!(req.members()[3].ptr_eq(&d));
    }

    #[test]
    fn leaf_left_operand_does_not_flatten_right() {
        let (a, b, c) = (session_eq("a", "A"), session_eq("b", "B"), session_eq("c", "C"));
        let req = &a & &(&b & &c);

        assert_eq!(req.members().len(), 2);
        assert_eq!(req.members()[1].kind(), RequirementKind::All);
    }

    #[test]
    fn mixed_operators_nest() {
        let (a, b, c) = (session_eq("a", "A"), session_eq("b", "B"), session_eq("c", "C"));
        let req = (&a & &b) | c;

        assert_eq!(req.kind(), RequirementKind::Any);
        assert_eq!(req.members().len(), 2);
        assert_eq!(req.members()[0].kind(), RequirementKind::All);
        assert_eq!(req.members()[0].members().len(), 2);
    }

    #[test]
    fn compound_with_overrides_stays_nested() {
        let (a, b, c) = (session_eq("a", "A"), session_eq("b", "B"), session_eq("c", "C"));
        let left = AllRequire::new([a, b]).unwrap().with_flash("AND");
        let req = &left & &c;

        assert_eq!(req.members().len(), 2);
        assert!(req.members()[0].ptr_eq(&left));
        assert_eq!(
            fail_message(&req, &RequestAdapter::new("r")).as_deref(),
            Some("AND")
        );
    }

    #[test]
    fn right_operand_with_overrides_is_not_spliced() {
        let (a, b, c) = (session_eq("a", "A"), session_eq("b", "B"), session_eq("c", "C"));
        let right = AllRequire::new([b, c]).unwrap().with_flash("B and C");
        let req = AllRequire::new([a.clone()]).unwrap() & right.clone();

        assert_eq!(req.members().len(), 2);
        assert!(req.members()[0].ptr_eq(&a));
        assert!(req.members()[1].ptr_eq(&right));
        assert_eq!(
            fail_message(&req, &RequestAdapter::new("r").with_session("a", "A")).as_deref(),
            Some("B and C")
        );
    }

    #[test]
    fn required_args_are_unioned() {
        let x = Require::with_args(["x"], |_, _| true, "index").unwrap();
        let y = Require::with_args(["y"], |_, _| true, "index").unwrap();
        let plain = Require::new(|_| true, "index");

        let req = (&x | &plain) & y;
        let names: Vec<&str> = req.required_args().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}
