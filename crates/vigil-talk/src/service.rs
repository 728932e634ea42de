// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exclusive talk-session lifecycle.
//!
//! A PSO can be in at most one open talk session. The service checks before
//! creating to produce a conflict error naming the current owner; the store
//! enforces the same invariant as a hard constraint for concurrent starts.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use vigil_core::events::{event_names, TalkStartEvent, TalkStopEvent};
use vigil_core::model::NewTalkSession;
use vigil_core::traits::{Broadcaster, TalkSessionRepository, UserRepository};
use vigil_core::types::{TalkSessionId, TalkStopReason, UserId, UserKey};
use vigil_core::{best_effort, VigilError};

/// Result of starting a talk session.
#[derive(Debug, Clone, PartialEq)]
pub struct TalkStartReceipt {
    pub talk_session_id: TalkSessionId,
    pub message: String,
}

/// Owns the exclusive supervisor-to-PSO talk-session lifecycle.
pub struct TalkService {
    sessions: Arc<dyn TalkSessionRepository>,
    users: Arc<dyn UserRepository>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl TalkService {
    pub fn new(
        sessions: Arc<dyn TalkSessionRepository>,
        users: Arc<dyn UserRepository>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            sessions,
            users,
            broadcaster,
        }
    }

    /// Open a talk session from a supervisor (keyed by external directory
    /// id) to a PSO (keyed by email).
    pub async fn start(
        &self,
        supervisor_external_id: &str,
        pso_email: &str,
    ) -> Result<TalkStartReceipt, VigilError> {
        let supervisor = self
            .users
            .resolve(&UserKey::ByExternalId(supervisor_external_id.to_string()))
            .await?;
        let pso = self
            .users
            .resolve(&UserKey::ByEmail(pso_email.to_string()))
            .await?;

        let active = self.sessions.find_active_by_pso(&pso.id).await?;
        if let Some(existing) = active.first() {
            // Resolve the current owner for the error message; the conflict
            // stands even when the lookup misses.
            let owner = best_effort(
                "talk session owner lookup",
                self.users.find_by_id(&existing.supervisor_id),
            )
            .await
            .flatten()
            .map(|u| u.display_name);
            return Err(VigilError::TalkSessionActive {
                pso: pso.email,
                owner,
            });
        }

        let session = self
            .sessions
            .create(NewTalkSession {
                supervisor_id: supervisor.id.clone(),
                pso_id: pso.id.clone(),
                started_at: Utc::now(),
            })
            .await
            .map_err(|err| match err {
                // The store raced another start and won the invariant check.
                VigilError::TalkSessionActive { owner, .. } => VigilError::TalkSessionActive {
                    pso: pso.email.clone(),
                    owner,
                },
                other => other,
            })?;
        debug!(session = %session.id, pso = %pso.email, "talk session started");

        let event = TalkStartEvent {
            talk_session_id: session.id.clone(),
            supervisor_email: supervisor.email.clone(),
            supervisor_name: supervisor.display_name.clone(),
        };
        self.broadcaster
            .broadcast_message(
                &pso.email,
                json!({ "event": event_names::TALK_SESSION_START, "data": event }),
            )
            .await?;

        Ok(TalkStartReceipt {
            message: format!(
                "Talk session started between {} and {}",
                supervisor.email, pso.email
            ),
            talk_session_id: session.id,
        })
    }

    /// Stop a talk session. The PSO is notified only when their directory
    /// row still resolves; a lookup miss never blocks the stop.
    pub async fn stop(
        &self,
        id: &TalkSessionId,
        reason: TalkStopReason,
    ) -> Result<(), VigilError> {
        let session = self
            .sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| VigilError::TalkSessionNotFound { id: id.clone() })?;

        self.sessions.stop(id, reason, Utc::now()).await?;
        debug!(session = %id, reason = %reason, "talk session stopped");

        let pso = best_effort("talk pso lookup", self.users.find_by_id(&session.pso_id))
            .await
            .flatten();
        if let Some(pso) = pso {
            self.broadcast_talk_stopped(&pso.email).await?;
        }
        Ok(())
    }

    /// Notify a PSO channel that their talk session ended. Exposed for the
    /// disconnect cascade.
    pub async fn broadcast_talk_stopped(&self, pso_email: &str) -> Result<(), VigilError> {
        let event = TalkStopEvent {
            pso_email: pso_email.to_string(),
        };
        self.broadcaster
            .broadcast_message(
                pso_email,
                json!({ "event": event_names::TALK_SESSION_STOP, "data": event }),
            )
            .await
    }

    /// Stop every open session owned by the supervisor, notifying each
    /// affected PSO. One session's failure never blocks the rest. Returns
    /// the number of sessions stopped.
    pub async fn stop_all_for_supervisor(
        &self,
        supervisor_id: &UserId,
        reason: TalkStopReason,
    ) -> Result<usize, VigilError> {
        let open = self.sessions.find_active_by_supervisor(supervisor_id).await?;
        let mut stopped = 0;
        for session in open {
            if best_effort("talk session teardown", self.stop(&session.id, reason))
                .await
                .is_some()
            {
                stopped += 1;
            }
        }
        Ok(stopped)
    }

    /// Stop every open session where the user is the PSO side. Same
    /// per-session tolerance as [`stop_all_for_supervisor`].
    pub async fn stop_all_for_pso(
        &self,
        pso_id: &UserId,
        reason: TalkStopReason,
    ) -> Result<usize, VigilError> {
        let open = self.sessions.find_active_by_pso(pso_id).await?;
        let mut stopped = 0;
        for session in open {
            if best_effort("talk session teardown", self.stop(&session.id, reason))
                .await
                .is_some()
            {
                stopped += 1;
            }
        }
        Ok(stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_test_utils::TestWorld;

    fn service(world: &TestWorld) -> TalkService {
        TalkService::new(
            world.talk_sessions.clone(),
            world.users.clone(),
            world.broadcaster.clone(),
        )
    }

    #[tokio::test]
    async fn start_creates_session_and_notifies_pso() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup).await;
        let service = service(&world);

        let receipt = service.start(&sup.external_id, &pso.email).await.unwrap();

        let session = world.talk_sessions.get(&receipt.talk_session_id).await.unwrap();
        assert!(session.is_open());
        assert_eq!(session.supervisor_id, sup.id);
        assert_eq!(session.pso_id, pso.id);

        let sent = world.broadcaster.channel_payloads("pso@example.com").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["event"], "talk_session_start");
        assert_eq!(sent[0]["data"]["supervisorName"], "Sam Soto");
    }

    #[tokio::test]
    async fn second_start_conflicts_and_names_current_owner() {
        let world = TestWorld::new();
        let sup_a = world.supervisor("a@example.com", "Alice Admin").await;
        let sup_b = world.supervisor("b@example.com", "Bob Backup").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup_a).await;
        let service = service(&world);

        let first = service.start(&sup_a.external_id, &pso.email).await.unwrap();
        let err = service
            .start(&sup_b.external_id, &pso.email)
            .await
            .unwrap_err();

        match err {
            VigilError::TalkSessionActive { pso: key, owner } => {
                assert_eq!(key, "pso@example.com");
                assert_eq!(owner.as_deref(), Some("Alice Admin"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        // The first session is untouched.
        assert!(world
            .talk_sessions
            .get(&first.talk_session_id)
            .await
            .unwrap()
            .is_open());
    }

    #[tokio::test]
    async fn stop_persists_reason_and_notifies() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup).await;
        let service = service(&world);

        let receipt = service.start(&sup.external_id, &pso.email).await.unwrap();
        service
            .stop(&receipt.talk_session_id, TalkStopReason::UserInitiated)
            .await
            .unwrap();

        let session = world.talk_sessions.get(&receipt.talk_session_id).await.unwrap();
        assert!(session.stopped_at.is_some());
        assert_eq!(session.stop_reason, Some(TalkStopReason::UserInitiated));

        let sent = world.broadcaster.channel_payloads("pso@example.com").await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1]["event"], "talk_session_stop");
    }

    #[tokio::test]
    async fn stop_succeeds_when_pso_row_is_gone() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup).await;
        let service = service(&world);

        let receipt = service.start(&sup.external_id, &pso.email).await.unwrap();
        world.users.remove(&pso.id).await;

        service
            .stop(&receipt.talk_session_id, TalkStopReason::UserInitiated)
            .await
            .unwrap();

        let session = world.talk_sessions.get(&receipt.talk_session_id).await.unwrap();
        assert!(session.stopped_at.is_some());
        // No stop notification: the PSO projection was already gone.
        let sent = world.broadcaster.channel_payloads("pso@example.com").await;
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn stop_unknown_session_is_not_found() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .stop(&TalkSessionId("ts-ghost".into()), TalkStopReason::UserInitiated)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::TalkSessionNotFound { .. }));
    }

    #[tokio::test]
    async fn supervisor_teardown_stops_all_owned_sessions() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso_a = world.field_user("a@example.com", "Ann Field", &sup).await;
        let pso_b = world.field_user("b@example.com", "Ben Field", &sup).await;
        let service = service(&world);

        service.start(&sup.external_id, &pso_a.email).await.unwrap();
        service.start(&sup.external_id, &pso_b.email).await.unwrap();

        let stopped = service
            .stop_all_for_supervisor(&sup.id, TalkStopReason::SupervisorDisconnected)
            .await
            .unwrap();
        assert_eq!(stopped, 2);

        for session in world.talk_sessions.all().await {
            assert_eq!(
                session.stop_reason,
                Some(TalkStopReason::SupervisorDisconnected)
            );
        }
        // Both PSOs got a stop notification (after their start one).
        assert_eq!(
            world.broadcaster.channel_payloads("a@example.com").await.len(),
            2
        );
        assert_eq!(
            world.broadcaster.channel_payloads("b@example.com").await.len(),
            2
        );
    }
}
