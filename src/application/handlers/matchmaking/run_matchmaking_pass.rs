//! RunMatchmakingPassHandler - Turns planned pairings into proposals.
//!
//! The planner works on a snapshot of the queue. Each pairing is then
//! committed by claiming both candidates with compare-and-set updates, so
//! passes running concurrently (or racing a dequeue) can never place one
//! candidate in two proposals. A pairing that loses such a race is counted
//! as a conflict and left for the next pass.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::application::MatchmakingError;
use crate::config::MatchingConfig;
use crate::domain::candidate::{Candidate, QueueEntry};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCategory, ErrorCode, MatchId, SerializableDomainEvent,
    Timestamp, UserId,
};
use crate::domain::matchmaking::{plan_pairings, ProposedPairing};
use crate::domain::proposal::{Match, MatchProposed};
use crate::ports::{CandidateRepository, Clock, EventPublisher, MatchRepository};

/// Outcome of one matchmaking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchmakingPassReport {
    /// Matches proposed by this pass, in planning order.
    pub proposed: Vec<MatchId>,
    /// Pairings abandoned because a candidate changed under the pass.
    pub conflicts: usize,
    /// Pairings refused by a safety check.
    pub skipped: usize,
}

pub struct RunMatchmakingPassHandler {
    candidates: Arc<dyn CandidateRepository>,
    matches: Arc<dyn MatchRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    config: MatchingConfig,
}

impl RunMatchmakingPassHandler {
    pub fn new(
        candidates: Arc<dyn CandidateRepository>,
        matches: Arc<dyn MatchRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            candidates,
            matches,
            publisher,
            clock,
            config,
        }
    }

    /// Runs one pass over the current queue.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures abort the pass; per-pairing conflicts
    /// are reported in the result.
    pub async fn handle(
        &self,
        metadata: CommandMetadata,
    ) -> Result<MatchmakingPassReport, MatchmakingError> {
        let now = self.clock.now();
        let queue = self.candidates.find_queued().await?;
        let pairings = plan_pairings(&queue, &self.config.pairing_policy(), now);

        let mut report = MatchmakingPassReport::default();
        if pairings.is_empty() {
            return Ok(report);
        }

        let snapshot: HashMap<UserId, Candidate> = queue
            .into_iter()
            .map(|c| (c.user_id().clone(), c))
            .collect();

        for pairing in pairings {
            let (user1, user2) = (pairing.user1.clone(), pairing.user2.clone());
            let (Some(a), Some(b)) = (snapshot.get(&user1), snapshot.get(&user2)) else {
                report.skipped += 1;
                continue;
            };

            match self.propose(a.clone(), b.clone(), pairing, now, &metadata).await {
                Ok(match_id) => report.proposed.push(match_id),
                Err(e) => match e.category() {
                    ErrorCategory::PolicyViolation => {
                        error!(user1 = %user1, user2 = %user2, error = %e, "pairing refused");
                        report.skipped += 1;
                    }
                    ErrorCategory::ConcurrencyConflict | ErrorCategory::StateConflict => {
                        debug!(user1 = %user1, user2 = %user2, error = %e, "pairing lost a race");
                        report.conflicts += 1;
                    }
                    _ => return Err(e.into()),
                },
            }
        }

        info!(
            proposed = report.proposed.len(),
            conflicts = report.conflicts,
            skipped = report.skipped,
            correlation_id = metadata.correlation_id(),
            "matchmaking pass complete"
        );
        Ok(report)
    }

    async fn propose(
        &self,
        mut a: Candidate,
        mut b: Candidate,
        pairing: ProposedPairing,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<MatchId, DomainError> {
        if !a.is_mutually_unblocked(&b) {
            return Err(DomainError::new(
                ErrorCode::PolicyViolation,
                format!("Planned pairing of blocked users {} and {}", a.user_id(), b.user_id()),
            ));
        }

        let match_id = MatchId::new();

        let entry_a = a.claim_for_proposal(match_id, now)?;
        let version = self.candidates.update(&a).await?;
        let a = a.with_version(version);

        let claimed_b = match b.claim_for_proposal(match_id, now) {
            Ok(entry) => self.candidates.update(&b).await.map(|v| (entry, v)),
            Err(e) => Err(e),
        };
        let (entry_b, version) = match claimed_b {
            Ok(claimed) => claimed,
            Err(e) => {
                self.unclaim(a, entry_a, now).await;
                return Err(e);
            }
        };
        let b = b.with_version(version);

        let saved = match Match::propose(match_id, pairing, self.config.proposal_ttl(), now) {
            Ok(m) => self.matches.save(&m).await.map(|()| m),
            Err(e) => Err(e),
        };
        let proposal = match saved {
            Ok(m) => m,
            Err(e) => {
                self.unclaim(a, entry_a, now).await;
                self.unclaim(b, entry_b, now).await;
                return Err(e);
            }
        };

        self.publisher
            .publish(metadata.stamp(MatchProposed::from_match(&proposal).to_envelope()))
            .await?;

        debug!(
            match_id = %match_id,
            user1 = %proposal.user1(),
            user2 = %proposal.user2(),
            score = proposal.score(),
            "match proposed"
        );
        Ok(match_id)
    }

    /// Puts a claimed candidate back at its original queue position.
    async fn unclaim(&self, mut candidate: Candidate, entry: QueueEntry, now: Timestamp) {
        let result = match candidate.release_to_queue(entry, now) {
            Ok(()) => self.candidates.update(&candidate).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(user_id = %candidate.user_id(), error = %e, "failed to undo candidate claim");
        }
    }
}
