//! Property-based tests for candidate eligibility.

use super::aggregate::fixtures::*;
use super::*;
use crate::domain::foundation::MatchId;
use chrono::Duration;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Enqueue(i32),
    Dequeue,
    Claim,
    MarkMatched,
    ReturnToIdle,
    Cooldown(i64),
    Refresh,
    Strike,
    Advance(i64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-5i32..5).prop_map(Op::Enqueue),
        Just(Op::Dequeue),
        Just(Op::Claim),
        Just(Op::MarkMatched),
        Just(Op::ReturnToIdle),
        (1i64..600).prop_map(Op::Cooldown),
        Just(Op::Refresh),
        Just(Op::Strike),
        (1i64..900).prop_map(Op::Advance),
    ]
}

fn apply(candidate: &mut Candidate, op: &Op, clock: &mut i64) {
    let now = at(*clock);
    // Rejected operations are expected; only the invariants matter here.
    let _ = match op {
        Op::Enqueue(p) => candidate.enqueue(*p, now).map(|_| ()),
        Op::Dequeue => candidate.dequeue(now),
        Op::Claim => candidate.claim_for_proposal(MatchId::new(), now).map(|_| ()),
        Op::MarkMatched => candidate.mark_matched(now),
        Op::ReturnToIdle => candidate.return_to_idle(now),
        Op::Cooldown(secs) => {
            candidate.apply_cooldown(Duration::seconds(*secs), "rejection", now);
            Ok(())
        }
        Op::Refresh => {
            candidate.refresh_cooldown(now);
            Ok(())
        }
        Op::Strike => {
            candidate.record_strike(now);
            Ok(())
        }
        Op::Advance(secs) => {
            *clock += secs;
            Ok(())
        }
    };
}

proptest! {
    #[test]
    fn available_implies_idle_without_cooldown_or_strikes(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut candidate = english_learner("ana");
        let mut clock = 0i64;

        for op in &ops {
            apply(&mut candidate, op, &mut clock);
            let now = at(clock);

            if candidate.is_available(now) {
                prop_assert_eq!(candidate.status(), CandidateStatus::Idle);
                prop_assert!(candidate.strike_count() < STRIKE_LIMIT);
                prop_assert!(!candidate.is_in_cooldown(now));
            }
        }
    }

    #[test]
    fn queue_entry_present_iff_queued(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut candidate = english_learner("ana");
        let mut clock = 0i64;

        for op in &ops {
            apply(&mut candidate, op, &mut clock);
            prop_assert_eq!(
                candidate.queue_entry().is_some(),
                candidate.status() == CandidateStatus::Queued
            );
            if candidate.status() == CandidateStatus::Cooldown {
                prop_assert!(candidate.cooldown_until().is_some());
            }
            if candidate.status().is_committed() {
                prop_assert!(candidate.current_match().is_some());
            }
        }
    }
}
