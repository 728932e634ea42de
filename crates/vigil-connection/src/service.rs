// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connect/disconnect coordination over a transport session.
//!
//! Only connect and disconnect are observable here; intermediate transport
//! states stay in the transport layer. Disconnect runs an ordered cascade
//! -- talk sessions, then recordings, then presence/streaming, then a
//! reconciliation broadcast -- with every step individually caught so a
//! disconnect can never get stuck on one failing dependency.

use std::sync::Arc;

use tracing::info;

use vigil_core::traits::{Broadcaster, StreamingSessions, UserRepository};
use vigil_core::types::{StreamStopReason, TalkStopReason, UserKey};
use vigil_core::{best_effort, VigilError};
use vigil_presence::PresenceService;
use vigil_recording::RecordingOrchestrator;
use vigil_talk::TalkService;

/// Top-level coordinator invoked on transport connect/disconnect events.
pub struct ConnectionService {
    users: Arc<dyn UserRepository>,
    presence: Arc<PresenceService>,
    talk: Arc<TalkService>,
    recordings: Arc<RecordingOrchestrator>,
    streaming: Arc<dyn StreamingSessions>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl ConnectionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        presence: Arc<PresenceService>,
        talk: Arc<TalkService>,
        recordings: Arc<RecordingOrchestrator>,
        streaming: Arc<dyn StreamingSessions>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            users,
            presence,
            talk,
            recordings,
            streaming,
            broadcaster,
        }
    }

    /// A client connected: mark them online, then best-effort reconcile all
    /// observers against the source of truth.
    pub async fn handle_connect(&self, key: &UserKey) -> Result<(), VigilError> {
        if key.is_blank() {
            return Err(VigilError::Validation("connection key must not be empty".into()));
        }

        self.presence.set_online(key).await?;
        best_effort("presence reconciliation", self.broadcaster.sync_all_users()).await;
        Ok(())
    }

    /// A client disconnected: run the ordered teardown cascade. Returns Ok
    /// once every step has been attempted, regardless of individual step
    /// outcomes.
    pub async fn handle_disconnect(&self, key: &UserKey) -> Result<(), VigilError> {
        if key.is_blank() {
            return Err(VigilError::Validation("connection key must not be empty".into()));
        }
        // By disconnect time the user must already exist; a miss is a
        // distinct error, not a silent no-op.
        let user = self.users.resolve(key).await?;
        info!(user = %user.email, "disconnect cascade started");

        // 1. Talk sessions: everything they own as a supervisor, then
        //    everything where they are the PSO side.
        if user.role.is_supervisor_capable() {
            best_effort(
                "supervisor talk teardown",
                self.talk
                    .stop_all_for_supervisor(&user.id, TalkStopReason::SupervisorDisconnected),
            )
            .await;
        }
        best_effort(
            "pso talk teardown",
            self.talk
                .stop_all_for_pso(&user.id, TalkStopReason::PsoDisconnected),
        )
        .await;

        // 2. Recordings.
        if let Some(summary) = best_effort(
            "recording teardown",
            self.recordings.stop_all_for_user(&user),
        )
        .await
        {
            info!(
                user = %user.email,
                total = summary.total,
                completed = summary.completed,
                "recordings stopped on disconnect"
            );
        }

        // 3. Presence, then the streaming session.
        best_effort("presence offline", self.presence.set_offline(key)).await;
        best_effort(
            "streaming stop",
            self.streaming.stop(&user.id, StreamStopReason::Disconnect),
        )
        .await;

        // 4. Reconciliation broadcast.
        best_effort("presence reconciliation", self.broadcaster.sync_all_users()).await;

        info!(user = %user.email, "disconnect cascade finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::types::PresenceStatus;
    use vigil_test_utils::TestWorld;

    fn service(world: &TestWorld) -> ConnectionService {
        let presence = Arc::new(PresenceService::new(
            world.users.clone(),
            world.presence.clone(),
            world.broadcaster.clone(),
        ));
        let talk = Arc::new(TalkService::new(
            world.talk_sessions.clone(),
            world.users.clone(),
            world.broadcaster.clone(),
        ));
        let recordings = Arc::new(RecordingOrchestrator::new(
            world.egress.clone(),
            world.recordings.clone(),
            world.blobs.clone(),
            vigil_config::RecordingConfig::default(),
        ));
        ConnectionService::new(
            world.users.clone(),
            presence,
            talk,
            recordings,
            world.streaming.clone(),
            world.broadcaster.clone(),
        )
    }

    #[tokio::test]
    async fn connect_rejects_blank_keys() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .handle_connect(&UserKey::ByEmail("  ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
        assert!(world.broadcaster.presence_updates().await.is_empty());
    }

    #[tokio::test]
    async fn connect_sets_online_and_reconciles() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        let service = service(&world);

        service
            .handle_connect(&UserKey::ByEmail(pso.email.clone()))
            .await
            .unwrap();

        let updates = world.broadcaster.presence_updates().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status, PresenceStatus::Online);
        assert_eq!(world.broadcaster.sync_call_count(), 1);
    }

    #[tokio::test]
    async fn connect_survives_reconciliation_failure() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        world.broadcaster.fail_sync();
        let service = service(&world);

        service
            .handle_connect(&UserKey::ByEmail(pso.email.clone()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disconnect_unknown_user_is_a_distinct_error() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .handle_disconnect(&UserKey::ByEmail("ghost@example.com".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn disconnect_rejects_blank_keys() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .handle_disconnect(&UserKey::ById(vigil_core::types::UserId(String::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn disconnect_succeeds_when_every_side_channel_fails() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        world.broadcaster.fail_presence();
        world.broadcaster.fail_messages();
        world.broadcaster.fail_sync();
        world.streaming.fail_all();
        let service = service(&world);

        service
            .handle_disconnect(&UserKey::ById(pso.id.clone()))
            .await
            .unwrap();

        // Presence persistence still happened even though its broadcast
        // failed.
        use vigil_core::traits::PresenceRepository;
        let record = world.presence.find_by_user_id(&pso.id).await.unwrap();
        assert_eq!(record.unwrap().status, PresenceStatus::Offline);
    }
}
