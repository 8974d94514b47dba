//! End-to-end matchmaking flow through the public handlers.
//!
//! Registers two complementary learners, queues them, runs a matchmaking
//! pass, walks the proposal protocol to a session and ends it. Uses the
//! in-memory adapters and a manual clock.

use std::sync::Arc;

use lingua_pair::adapters::{
    InMemoryCandidateRepository, InMemoryEventBus, InMemoryHistoryRepository,
    InMemoryMatchRepository, InMemorySessionRepository, ManualClock,
};
use lingua_pair::application::{
    EndSessionCommand, EndSessionHandler, EnqueueCandidateCommand, EnqueueCandidateHandler,
    RegisterCandidateCommand, RegisterCandidateHandler, RespondToMatchCommand,
    RespondToMatchHandler, RunMatchmakingPassHandler, RunSweepHandler,
};
use lingua_pair::config::AppConfig;
use lingua_pair::domain::candidate::{
    CandidateStatus, CefrLevel, LanguageCode, MatchingProfile, TargetLanguage,
};
use lingua_pair::domain::foundation::{CommandMetadata, MatchId, Timestamp, UserId};
use lingua_pair::domain::history::HistoryKind;
use lingua_pair::domain::proposal::{Decision, MatchState};
use lingua_pair::domain::session::{EndReason, SessionState};
use lingua_pair::ports::{CandidateRepository, HistoryRepository, MatchRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    candidates: Arc<InMemoryCandidateRepository>,
    matches: Arc<InMemoryMatchRepository>,
    sessions: Arc<InMemorySessionRepository>,
    history: Arc<InMemoryHistoryRepository>,
    bus: Arc<InMemoryEventBus>,
    clock: Arc<ManualClock>,
    config: AppConfig,
}

impl World {
    fn new() -> Self {
        Self {
            candidates: Arc::new(InMemoryCandidateRepository::new()),
            matches: Arc::new(InMemoryMatchRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            history: Arc::new(InMemoryHistoryRepository::new()),
            bus: Arc::new(InMemoryEventBus::new()),
            clock: Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_705_276_800))),
            config: AppConfig::default(),
        }
    }

    async fn join_queue(&self, id: &str, native: &str, target: &str) -> UserId {
        let user_id = UserId::new(id).unwrap();
        let profile = MatchingProfile::new(
            vec![LanguageCode::new(native).unwrap()],
            vec![TargetLanguage::new(
                LanguageCode::new(target).unwrap(),
                CefrLevel::B1,
            )],
            ["cooking", "films"],
            60,
        )
        .unwrap();

        RegisterCandidateHandler::new(self.candidates.clone(), self.clock.clone())
            .handle(
                RegisterCandidateCommand {
                    user_id: user_id.clone(),
                    profile,
                    preferences: None,
                },
                CommandMetadata::for_user(user_id.clone()),
            )
            .await
            .unwrap();

        EnqueueCandidateHandler::new(
            self.candidates.clone(),
            self.bus.clone(),
            self.clock.clone(),
            self.config.matching.clone(),
        )
        .handle(
            EnqueueCandidateCommand {
                user_id: user_id.clone(),
                priority: 0,
            },
            CommandMetadata::for_user(user_id.clone()),
        )
        .await
        .unwrap();

        user_id
    }

    async fn run_pass(&self) -> Vec<MatchId> {
        RunMatchmakingPassHandler::new(
            self.candidates.clone(),
            self.matches.clone(),
            self.bus.clone(),
            self.clock.clone(),
            self.config.matching.clone(),
        )
        .handle(CommandMetadata::system("matchmaker"))
        .await
        .unwrap()
        .proposed
    }

    fn responder(&self) -> RespondToMatchHandler {
        RespondToMatchHandler::new(
            self.candidates.clone(),
            self.matches.clone(),
            self.sessions.clone(),
            self.history.clone(),
            self.bus.clone(),
            self.clock.clone(),
            self.config.matching.clone(),
            self.config.session.clone(),
        )
    }

    fn sweeper(&self) -> RunSweepHandler {
        RunSweepHandler::new(
            self.candidates.clone(),
            self.matches.clone(),
            self.sessions.clone(),
            self.history.clone(),
            self.bus.clone(),
            self.clock.clone(),
            self.config.matching.clone(),
            self.config.session.clone(),
        )
    }

    async fn status(&self, user_id: &UserId) -> CandidateStatus {
        self.candidates
            .find_by_user(user_id)
            .await
            .unwrap()
            .unwrap()
            .status()
    }
}

fn respond(match_id: MatchId, user_id: &UserId, decision: Decision) -> RespondToMatchCommand {
    RespondToMatchCommand {
        match_id,
        user_id: user_id.clone(),
        decision,
        planned_minutes: None,
    }
}

// =============================================================================
// Flows
// =============================================================================

#[tokio::test]
async fn accepted_match_runs_a_session_to_completion() {
    let world = World::new();
    let ana = world.join_queue("ana", "en", "es").await;
    let ben = world.join_queue("ben", "es", "en").await;

    let proposed = world.run_pass().await;
    assert_eq!(proposed.len(), 1);
    let match_id = proposed[0];
    assert_eq!(world.status(&ana).await, CandidateStatus::Proposed);
    assert!(world.bus.has_event("match.proposed.v1"));

    let responder = world.responder();
    world.clock.advance_secs(10);
    let first = responder
        .handle(
            respond(match_id, &ana, Decision::Accept),
            CommandMetadata::for_user(ana.clone()),
        )
        .await
        .unwrap();
    assert_eq!(first.match_state, MatchState::Proposed);
    assert!(first.session.is_none());

    world.clock.advance_secs(5);
    let second = responder
        .handle(
            respond(match_id, &ben, Decision::Accept),
            CommandMetadata::for_user(ben.clone()),
        )
        .await
        .unwrap();
    assert_eq!(second.match_state, MatchState::SessionCreated);
    let session = second.session.unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(world.status(&ana).await, CandidateStatus::Matched);
    assert_eq!(world.status(&ben).await, CandidateStatus::Matched);
    assert!(world.bus.has_event("session.started.v1"));

    world.clock.advance_secs(20 * 60);
    let ended = EndSessionHandler::new(
        world.candidates.clone(),
        world.matches.clone(),
        world.sessions.clone(),
        world.history.clone(),
        world.bus.clone(),
        world.clock.clone(),
    )
    .handle(
        EndSessionCommand {
            session_id: session.id(),
            ended_by: Some(ana.clone()),
            reason: EndReason::Completed,
            quality_rating: Some(4.5),
        },
        CommandMetadata::for_user(ana.clone()),
    )
    .await
    .unwrap();
    assert_eq!(ended.session.state(), SessionState::Ended);
    assert_eq!(world.status(&ana).await, CandidateStatus::Idle);
    assert_eq!(world.status(&ben).await, CandidateStatus::Idle);
    assert!(world.bus.has_event("session.ended.v1"));

    let history = world.history.find_by_match(&match_id).await.unwrap();
    let kinds: Vec<_> = history.iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec![HistoryKind::Match, HistoryKind::Session]);
    let session_record = &history[1];
    assert!(session_record.session_completed());
    assert_eq!(session_record.session_quality(), Some(4.5));
}

#[tokio::test]
async fn rejection_cools_down_the_rejecter_and_frees_the_partner() {
    let world = World::new();
    let ana = world.join_queue("ana", "en", "es").await;
    let ben = world.join_queue("ben", "es", "en").await;
    let match_id = world.run_pass().await[0];

    let result = world
        .responder()
        .handle(
            respond(match_id, &ben, Decision::Reject),
            CommandMetadata::for_user(ben.clone()),
        )
        .await
        .unwrap();

    assert_eq!(result.match_state, MatchState::Rejected);
    assert_eq!(world.status(&ben).await, CandidateStatus::Cooldown);
    assert_eq!(world.status(&ana).await, CandidateStatus::Idle);
    assert!(world
        .matches
        .find_active_for_pair(&ana, &ben)
        .await
        .unwrap()
        .is_none());
    assert_eq!(world.history.find_by_match(&match_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unanswered_proposal_expires_on_sweep() {
    let world = World::new();
    let ana = world.join_queue("ana", "en", "es").await;
    let ben = world.join_queue("ben", "es", "en").await;
    let match_id = world.run_pass().await[0];

    world
        .clock
        .advance_secs(world.config.matching.proposal_ttl_secs + 1);
    let report = world
        .sweeper()
        .handle(CommandMetadata::system("sweep"))
        .await
        .unwrap();

    assert_eq!(report.expired_matches, 1);
    let m = world.matches.find_by_id(&match_id).await.unwrap().unwrap();
    assert_eq!(m.state(), MatchState::Expired);
    assert_eq!(world.status(&ana).await, CandidateStatus::Idle);
    assert_eq!(world.status(&ben).await, CandidateStatus::Idle);
    assert!(world.bus.has_event("match.expired.v1"));
}

#[tokio::test]
async fn same_language_learners_are_never_paired() {
    let world = World::new();
    world.join_queue("ana", "en", "es").await;
    world.join_queue("cat", "en", "es").await;

    assert!(world.run_pass().await.is_empty());
}
