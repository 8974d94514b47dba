//! FlagSessionContentHandler - Records moderation flags on a session.
//!
//! Flags come from a content-safety assessment of a message or from a
//! participant's report. The session only logs them; ending the session or
//! striking a user stays with the caller.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::config::ModerationConfig;
use crate::domain::foundation::{CommandMetadata, SerializableDomainEvent, SessionId, UserId};
use crate::domain::session::{ContentAssessment, ModerationKind, Session, SessionFlagged};
use crate::ports::{Clock, EventPublisher, SessionRepository};

#[derive(Debug, Clone)]
pub enum ContentFlag {
    /// Classifier verdict on a message written by `author`.
    Assessment {
        author: UserId,
        assessment: ContentAssessment,
    },
    /// A participant reporting their partner.
    UserReport { reporter: UserId, reason: String },
}

#[derive(Debug, Clone)]
pub struct FlagSessionContentCommand {
    pub session_id: SessionId,
    pub flag: ContentFlag,
}

#[derive(Debug, Clone)]
pub struct FlagSessionContentResult {
    pub session: Session,
    /// Flags added by this command; empty if the content was clean.
    pub flags: Vec<ModerationKind>,
}

pub struct FlagSessionContentHandler {
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    config: ModerationConfig,
}

impl FlagSessionContentHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: ModerationConfig,
    ) -> Self {
        Self {
            sessions,
            publisher,
            clock,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: FlagSessionContentCommand,
        metadata: CommandMetadata,
    ) -> Result<FlagSessionContentResult, MatchmakingError> {
        let now = self.clock.now();

        let (mut session, flags) = match &cmd.flag {
            ContentFlag::Assessment { author, assessment } => {
                let session =
                    load_for_participant(self.sessions.as_ref(), &cmd.session_id, author).await?;
                let details = json!({
                    "author": author.as_str(),
                    "toxicity_score": assessment.toxicity_score,
                    "contains_pii": assessment.contains_pii,
                });
                let flags: Vec<_> = self
                    .config
                    .policy()
                    .flags_for(assessment)
                    .into_iter()
                    .map(|kind| (kind, details.clone()))
                    .collect();
                (session, flags)
            }
            ContentFlag::UserReport { reporter, reason } => {
                let session =
                    load_for_participant(self.sessions.as_ref(), &cmd.session_id, reporter).await?;
                let details = json!({
                    "reporter": reporter.as_str(),
                    "reason": reason,
                });
                (session, vec![(ModerationKind::UserReport, details)])
            }
        };

        if flags.is_empty() {
            return Ok(FlagSessionContentResult {
                session,
                flags: Vec::new(),
            });
        }

        let kinds: Vec<ModerationKind> = flags.iter().map(|(kind, _)| *kind).collect();
        for (kind, details) in flags {
            session.add_moderation_flag(kind, details, now);
        }
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        let envelopes = kinds
            .iter()
            .map(|kind| metadata.stamp(SessionFlagged::new(&session, *kind, now).to_envelope()))
            .collect();
        self.publisher.publish_all(envelopes).await?;

        warn!(
            session_id = %session.id(),
            flags = ?kinds,
            toxicity_warnings = session.toxicity_warnings(),
            "session content flagged"
        );
        Ok(FlagSessionContentResult {
            session,
            flags: kinds,
        })
    }
}
