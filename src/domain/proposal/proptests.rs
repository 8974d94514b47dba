//! Property-based tests for the proposal protocol.

use super::aggregate::fixtures::proposed;
use super::*;
use crate::domain::candidate::fixtures::{at, user};
use proptest::prelude::*;

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Accept), Just(Decision::Reject)]
}

/// Optional answer for one side: decision and the second it arrives.
fn arb_answer() -> impl Strategy<Value = Option<(Decision, i64)>> {
    prop::option::of((arb_decision(), 0i64..=90))
}

proptest! {
    #[test]
    fn outcome_ignores_arrival_order(
        d1 in arb_decision(),
        d2 in arb_decision(),
        t1 in 0i64..=90,
        t2 in 0i64..=90,
    ) {
        let mut forward = proposed();
        forward.record_response(&user("ana"), d1, at(t1)).unwrap();
        forward.record_response(&user("ben"), d2, at(t2)).unwrap();

        let mut backward = proposed();
        backward.record_response(&user("ben"), d2, at(t2)).unwrap();
        backward.record_response(&user("ana"), d1, at(t1)).unwrap();

        prop_assert_eq!(forward.state(), backward.state());
        prop_assert_eq!(forward.rejection_reason(), backward.rejection_reason());
    }

    #[test]
    fn accepted_iff_both_accepted(d1 in arb_decision(), d2 in arb_decision()) {
        let mut m = proposed();
        m.record_response(&user("ana"), d1, at(1)).unwrap();
        m.record_response(&user("ben"), d2, at(2)).unwrap();

        let both = d1 == Decision::Accept && d2 == Decision::Accept;
        prop_assert_eq!(m.state() == MatchState::Accepted, both);
        prop_assert_eq!(m.is_accepted_by_both(), both);
        if d1 == Decision::Reject && d2 == Decision::Reject {
            prop_assert_eq!(m.rejection_reason(), Some(RejectionReason::BothRejected));
        }
    }

    #[test]
    fn expire_never_overwrites_a_response(a in arb_answer(), b in arb_answer()) {
        let mut m = proposed();
        if let Some((d, t)) = a {
            let _ = m.record_response(&user("ana"), d, at(t));
        }
        if let Some((d, t)) = b {
            let _ = m.record_response(&user("ben"), d, at(t));
        }
        let before = (m.user1_response(), m.user2_response());

        if m.expire(at(120)).is_ok() {
            prop_assert_eq!(m.state(), MatchState::Expired);
            if let Some(r) = before.0 {
                prop_assert_eq!(m.user1_response(), Some(r));
            }
            if let Some(r) = before.1 {
                prop_assert_eq!(m.user2_response(), Some(r));
            }
            prop_assert!(m.is_fully_responded());
        } else {
            // Only a fully answered match escapes expiry.
            prop_assert!(before.0.is_some() && before.1.is_some());
        }
    }
}
