//! Integration property tests for request-guard.
//!
//! These check the boolean laws of requirement trees and the value checks
//! over generated inputs.

use request_guard::web::RequestAdapter;
use request_guard::{
    Acceptor, AllRequire, AnyRequire, Args, FixedClock, Need, Require, Requirement,
    SessionRequire, TimestampAge, ValueCheck,
};
use proptest::prelude::*;
use serde_json::json;

fn bit(mask: u64) -> Requirement {
    SessionRequire::new(
        [Need::accepts(
            "x",
            Acceptor::check(move |v| v.as_u64().is_some_and(|x| x & mask != 0)),
        )],
        "index",
    )
    .unwrap()
}

fn holds(req: &Requirement, x: u64) -> bool {
    let adapter = RequestAdapter::new("req-prop").with_session("x", x);
    req.check(&adapter, &Args::new()).unwrap()
}

fn fixed(value: bool) -> Requirement {
    Require::new(move |_| value, "index")
}

// Strategy: a leaf that passes or fails
fn arb_leaf() -> impl Strategy<Value = (bool, Requirement)> {
    any::<bool>().prop_map(|v| (v, fixed(v)))
}

// Strategy: the eight ways to combine four requirements with & and |
fn arb_ops() -> impl Strategy<Value = [bool; 3]> {
    any::<[bool; 3]>()
}

fn apply(and: bool, a: &Requirement, b: &Requirement) -> Requirement {
    if and {
        a & b
    } else {
        a | b
    }
}

proptest! {
    /// Property: `(r1|r2)&(r3&r4)` over session bits matches the boolean formula.
    #[test]
    fn proptest_mixed_tree_matches_truth_table(x in 0u64..16) {
        let (r1, r2, r3, r4) = (bit(1), bit(2), bit(4), bit(8));
        let combined = &(&r1 | &r2) & &(&r3 & &r4);

        let expected = (x & 1 != 0 || x & 2 != 0) && (x & 4 != 0 && x & 8 != 0);
        prop_assert_eq!(holds(&combined, x), expected);
    }

    /// Property: every left-nested four-way pattern matches the boolean formula.
    #[test]
    fn proptest_four_way_patterns(x in 0u64..16, ops in arb_ops()) {
        let reqs = [bit(1), bit(2), bit(4), bit(8)];
        let bits: Vec<bool> = [1u64, 2, 4, 8].iter().map(|m| x & m != 0).collect();

        let mut combined = reqs[0].clone();
        let mut expected = bits[0];
        for i in 0..3 {
            combined = apply(ops[i], &combined, &reqs[i + 1]);
            expected = if ops[i] { expected && bits[i + 1] } else { expected || bits[i + 1] };
        }
        prop_assert_eq!(holds(&combined, x), expected);
    }

    /// Property: three-way right-nested patterns match the boolean formula.
    #[test]
    fn proptest_three_way_right_nested(
        (a, ra) in arb_leaf(),
        (b, rb) in arb_leaf(),
        (c, rc) in arb_leaf(),
        outer in any::<bool>(),
        inner in any::<bool>(),
    ) {
        let right = apply(inner, &rb, &rc);
        let right_value = if inner { b && c } else { b || c };
        let combined = apply(outer, &ra, &right);
        let expected = if outer { a && right_value } else { a || right_value };

        let adapter = RequestAdapter::new("req-prop");
        prop_assert_eq!(combined.check(&adapter, &Args::new()).unwrap(), expected);
    }

    /// Property: key checks pass iff every need passes.
    #[test]
    fn proptest_needs_are_a_conjunction(present in prop::collection::vec(any::<bool>(), 1..=3)) {
        let keys = ["k0", "k1", "k2"];
        let needs: Vec<Need> = keys[..present.len()]
            .iter()
            .map(|k| Need::accepts(*k, *k))
            .collect();
        let req = SessionRequire::new(needs, "index").unwrap();

        let adapter = RequestAdapter::new("req-prop");
        for (key, set) in keys.iter().zip(&present) {
            let value = if *set { json!(key) } else { json!("other") };
            adapter.session_store().insert(*key, value);
        }
        let expected = present.iter().all(|p| *p);
        prop_assert_eq!(req.check(&adapter, &Args::new()).unwrap(), expected);
    }

    /// Property: chaining & is the same member list as one AllRequire.
    #[test]
    fn proptest_chained_and_flattens(n in 2usize..7) {
        let leaves: Vec<Requirement> = (0..n).map(|i| fixed(i % 2 == 0)).collect();
        let chained = leaves[1..]
            .iter()
            .fold(leaves[0].clone(), |acc, leaf| &acc & leaf);
        let direct = AllRequire::new(leaves.clone()).unwrap();

        prop_assert_eq!(chained.members().len(), direct.members().len());
        for (x, y) in chained.members().iter().zip(direct.members()) {
            prop_assert!(x.ptr_eq(y));
        }
    }

    /// Property: chaining | is the same member list as one AnyRequire.
    #[test]
    fn proptest_chained_or_flattens(n in 2usize..7) {
        let leaves: Vec<Requirement> = (0..n).map(|_| fixed(false)).collect();
        let chained = leaves[1..]
            .iter()
            .fold(leaves[0].clone(), |acc, leaf| &acc | leaf);
        let direct = AnyRequire::new(leaves.clone()).unwrap();

        prop_assert_eq!(chained.members().len(), direct.members().len());
        for (x, y) in chained.members().iter().zip(direct.members()) {
            prop_assert!(x.ptr_eq(y));
        }
    }

    /// Property: "3m" and 180 seconds agree for every timestamp.
    #[test]
    fn proptest_timestamp_units_agree(offset in -1_000.0f64..1_000.0) {
        let now = 1_700_000_000.0;
        let parsed = TimestampAge::parse("3m").unwrap().with_clock(FixedClock(now));
        let seconds = TimestampAge::new(180.0).unwrap().with_clock(FixedClock(now));

        let adapter = RequestAdapter::new("req-prop");
        let value = json!(now - 180.0 + offset);
        prop_assert_eq!(
            parsed.accepts(&value, &adapter),
            seconds.accepts(&value, &adapter)
        );
        prop_assert_eq!(parsed.age(), seconds.age());
    }
}

#[test]
fn one_day_boundary_is_inclusive() {
    let now = 1_700_000_000.0;
    let day = TimestampAge::parse("1d").unwrap().with_clock(FixedClock(now));
    let adapter = RequestAdapter::new("req-day");

    assert!(day.accepts(&json!(now - 86_400.0), &adapter));
    assert!(!day.accepts(&json!(now - 86_401.0), &adapter));
}
