//! Shared wiring for handler tests: in-memory adapters, a manual clock
//! starting at the fixture epoch, and default configuration.

use std::sync::Arc;

use crate::adapters::clock::ManualClock;
use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::{
    InMemoryCandidateRepository, InMemoryHistoryRepository, InMemoryMatchRepository,
    InMemorySessionRepository,
};
use crate::application::handlers::settlement::Settlement;
use crate::config::AppConfig;
use crate::domain::candidate::fixtures::{at, english_learner, queued, spanish_learner, user};
use crate::domain::candidate::Candidate;
use crate::domain::foundation::{CommandMetadata, MatchId, SessionId};
use crate::domain::proposal::fixtures::{accepted, proposed};
use crate::domain::proposal::Match;
use crate::domain::session::Session;
use crate::ports::{CandidateRepository, MatchRepository, SessionRepository};

pub(crate) struct TestContext {
    pub candidates: Arc<InMemoryCandidateRepository>,
    pub matches: Arc<InMemoryMatchRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub history: Arc<InMemoryHistoryRepository>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<ManualClock>,
    pub config: AppConfig,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            candidates: Arc::new(InMemoryCandidateRepository::new()),
            matches: Arc::new(InMemoryMatchRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            history: Arc::new(InMemoryHistoryRepository::new()),
            bus: Arc::new(InMemoryEventBus::new()),
            clock: Arc::new(ManualClock::new(at(0))),
            config: AppConfig::default(),
        }
    }

    pub fn settlement(&self) -> Settlement {
        Settlement::new(
            self.candidates.clone(),
            self.matches.clone(),
            self.history.clone(),
            self.bus.clone(),
        )
    }

    pub fn metadata(&self) -> CommandMetadata {
        CommandMetadata::test_fixture()
    }

    pub async fn seed(&self, candidate: Candidate) {
        self.candidates.save(&candidate).await.unwrap();
    }

    pub async fn seed_all(&self, candidates: impl IntoIterator<Item = Candidate>) {
        for c in candidates {
            self.seed(c).await;
        }
    }

    pub async fn candidate(&self, id: &str) -> Candidate {
        self.candidates
            .find_by_user(&user(id))
            .await
            .unwrap()
            .expect("candidate seeded")
    }

    pub async fn stored_match(&self, id: MatchId) -> Match {
        self.matches.find_by_id(&id).await.unwrap().expect("match stored")
    }

    pub async fn stored_session(&self, id: SessionId) -> Session {
        self.sessions.find_by_id(&id).await.unwrap().expect("session stored")
    }

    pub fn set_secs(&self, secs: i64) {
        self.clock.set(at(secs));
    }

    /// Stores the fixture proposal between "ana" and "ben" (t=0, 90 s TTL)
    /// with both candidates claimed by it.
    pub async fn seed_proposed(&self) -> Match {
        let m = proposed();
        for c in [english_learner("ana"), spanish_learner("ben")] {
            let mut c = queued(c, 0, 0);
            c.claim_for_proposal(m.id(), at(0)).unwrap();
            self.seed(c).await;
        }
        self.matches.save(&m).await.unwrap();
        m
    }

    /// Stores a live session between "ana" and "ben" started at t=0, its
    /// SessionCreated match, and both candidates Matched.
    pub async fn seed_session(&self) -> Session {
        let mut m = accepted();
        for c in [english_learner("ana"), spanish_learner("ben")] {
            let mut c = queued(c, 0, 0);
            c.claim_for_proposal(m.id(), at(0)).unwrap();
            c.mark_matched(at(0)).unwrap();
            self.seed(c).await;
        }
        let session = Session::start(SessionId::new(), &m, 25, at(0)).unwrap();
        m.create_session(session.id(), at(0)).unwrap();
        self.matches.save(&m).await.unwrap();
        self.sessions.save(&session).await.unwrap();
        session
    }
}
