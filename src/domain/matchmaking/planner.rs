//! Greedy pairing planner.
//!
//! Given a snapshot of candidates, decides who should be proposed to whom.
//! The planner never mutates anything; committing a plan (claiming both
//! candidates, creating the match) is the caller's job and may still lose
//! races against other passes.

use std::cmp::{Ordering, Reverse};

use crate::domain::candidate::Candidate;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::scoring::{
    derive_factors, is_compatible, language_pair, score, LanguagePair, MatchingFactors,
};

/// Score a pairing must strictly exceed by default.
pub const DEFAULT_MINIMUM_SCORE: f64 = 0.5;

/// Tunables for a planning pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairingPolicy {
    pub minimum_score: f64,
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self {
            minimum_score: DEFAULT_MINIMUM_SCORE,
        }
    }
}

/// A pairing the planner recommends proposing.
///
/// `user1` is the candidate earlier in queue order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedPairing {
    pub user1: UserId,
    pub user2: UserId,
    pub languages: LanguagePair,
    pub factors: MatchingFactors,
    pub score: f64,
}

/// Queue order: higher priority first, then longest waiting, then user id.
fn queue_order(a: &Candidate, b: &Candidate) -> Ordering {
    (Reverse(a.queue_priority()), a.queued_at(), a.user_id()).cmp(&(
        Reverse(b.queue_priority()),
        b.queued_at(),
        b.user_id(),
    ))
}

/// Plans disjoint pairings among the matchable candidates.
///
/// Candidates are visited in queue order; each takes its best-scoring
/// remaining partner that is unblocked both ways, compatible, and scores
/// above `policy.minimum_score`. Ties go to the partner earlier in queue
/// order.
pub fn plan_pairings(
    candidates: &[Candidate],
    policy: &PairingPolicy,
    now: Timestamp,
) -> Vec<ProposedPairing> {
    let mut pool: Vec<&Candidate> = candidates.iter().filter(|c| c.is_matchable(now)).collect();
    pool.sort_by(|a, b| queue_order(a, b));

    let mut taken = vec![false; pool.len()];
    let mut pairings = Vec::new();

    for i in 0..pool.len() {
        if taken[i] {
            continue;
        }
        let seeker = pool[i];
        let mut best: Option<(usize, MatchingFactors, f64)> = None;

        for (j, partner) in pool.iter().enumerate() {
            if j == i || taken[j] || seeker.user_id() == partner.user_id() {
                continue;
            }
            if !seeker.is_mutually_unblocked(partner) || !is_compatible(seeker, partner) {
                continue;
            }
            let factors = derive_factors(seeker, partner);
            let s = score(&factors);
            if s <= policy.minimum_score {
                continue;
            }
            if best.as_ref().map_or(true, |(_, _, best_score)| s > *best_score) {
                best = Some((j, factors, s));
            }
        }

        let Some((j, factors, s)) = best else {
            continue;
        };
        let (first, second) = if i < j { (seeker, pool[j]) } else { (pool[j], seeker) };
        let Some(languages) = language_pair(first.profile(), second.profile()) else {
            continue;
        };

        taken[i] = true;
        taken[j] = true;
        pairings.push(ProposedPairing {
            user1: first.user_id().clone(),
            user2: second.user_id().clone(),
            languages,
            factors,
            score: s,
        });
    }

    pairings
}
