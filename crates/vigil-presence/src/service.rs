// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence transitions and their broadcast fan-out.
//!
//! Every state change produces exactly one broadcast; callers never retry
//! broadcasts themselves. Broadcast failures propagate to the caller --
//! the disconnect cascade wraps its call sites in `best_effort` instead.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use vigil_core::events::PresenceUpdate;
use vigil_core::model::User;
use vigil_core::traits::{Broadcaster, PresenceRepository, UserRepository};
use vigil_core::types::{PresenceStatus, UserKey};
use vigil_core::{best_effort, VigilError};

/// Owns online/offline transitions and presence history.
pub struct PresenceService {
    users: Arc<dyn UserRepository>,
    presence: Arc<dyn PresenceRepository>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl PresenceService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        presence: Arc<dyn PresenceRepository>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            users,
            presence,
            broadcaster,
        }
    }

    /// Mark the user online: upsert the current record, open a history
    /// interval, and broadcast the change.
    pub async fn set_online(&self, key: &UserKey) -> Result<PresenceUpdate, VigilError> {
        let user = self.users.resolve(key).await?;
        let now = Utc::now();

        self.presence
            .upsert_presence(&user.id, PresenceStatus::Online, now)
            .await?;
        self.presence.open_history(&user.id, now).await?;
        debug!(user = %user.email, "presence set online");

        let update = self.build_update(&user, PresenceStatus::Online, now).await;
        self.broadcaster.broadcast_presence(update.clone()).await?;
        Ok(update)
    }

    /// Mark the user offline: upsert the current record, close the open
    /// history interval (no-op when none), and broadcast the change.
    pub async fn set_offline(&self, key: &UserKey) -> Result<PresenceUpdate, VigilError> {
        let user = self.users.resolve(key).await?;
        let now = Utc::now();

        self.presence
            .upsert_presence(&user.id, PresenceStatus::Offline, now)
            .await?;
        self.presence.close_open_history(&user.id, now).await?;
        debug!(user = %user.email, "presence set offline");

        let update = self.build_update(&user, PresenceStatus::Offline, now).await;
        self.broadcaster.broadcast_presence(update.clone()).await?;
        Ok(update)
    }

    /// Current status, defaulting to Offline when no record exists. Never
    /// writes a record.
    pub async fn get_status(&self, key: &UserKey) -> Result<PresenceStatus, VigilError> {
        let user = self.users.resolve(key).await?;
        let record = self.presence.find_by_user_id(&user.id).await?;
        Ok(record.map(|r| r.status).unwrap_or(PresenceStatus::Offline))
    }

    /// Assemble the broadcast payload. The supervisor email is resolved
    /// best-effort: a directory miss or error leaves it empty rather than
    /// failing the transition.
    async fn build_update(
        &self,
        user: &User,
        status: PresenceStatus,
        at: chrono::DateTime<Utc>,
    ) -> PresenceUpdate {
        let supervisor_email = match &user.supervisor_id {
            Some(supervisor_id) => {
                best_effort("supervisor lookup", self.users.find_by_id(supervisor_id))
                    .await
                    .flatten()
                    .map(|s| s.email)
            }
            None => None,
        };

        PresenceUpdate {
            email: user.email.clone(),
            full_name: user.display_name.clone(),
            status,
            last_seen_at: at,
            role: user.role,
            supervisor_id: user.supervisor_id.clone(),
            supervisor_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_test_utils::TestWorld;

    fn service(world: &TestWorld) -> PresenceService {
        PresenceService::new(
            world.users.clone(),
            world.presence.clone(),
            world.broadcaster.clone(),
        )
    }

    #[tokio::test]
    async fn online_then_offline_leaves_one_closed_history_row() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup).await;
        let service = service(&world);

        let key = UserKey::ByEmail(pso.email.clone());
        service.set_online(&key).await.unwrap();
        service.set_offline(&key).await.unwrap();

        let history = world.presence.history_for(&pso.id).await;
        assert_eq!(history.len(), 1);
        assert!(history[0].exited_at.is_some());
        assert_eq!(world.presence.open_history_count(&pso.id).await, 0);
    }

    #[tokio::test]
    async fn each_transition_broadcasts_exactly_once() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        let service = service(&world);

        let key = UserKey::ById(pso.id.clone());
        service.set_online(&key).await.unwrap();
        service.set_offline(&key).await.unwrap();

        let updates = world.broadcaster.presence_updates().await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].status, PresenceStatus::Online);
        assert_eq!(updates[1].status, PresenceStatus::Offline);
    }

    #[tokio::test]
    async fn broadcast_carries_supervisor_email() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.field_user("pso@example.com", "Pat Field", &sup).await;
        let service = service(&world);

        service
            .set_online(&UserKey::ByEmail(pso.email.clone()))
            .await
            .unwrap();

        let updates = world.broadcaster.presence_updates().await;
        assert_eq!(updates[0].supervisor_email.as_deref(), Some("sup@example.com"));
        assert_eq!(updates[0].supervisor_id, Some(sup.id));
    }

    #[tokio::test]
    async fn unknown_user_fails_with_user_not_found() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .set_online(&UserKey::ByEmail("ghost@example.com".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn status_defaults_to_offline_without_record() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        let service = service(&world);

        let status = service
            .get_status(&UserKey::ByExternalId(pso.external_id.clone()))
            .await
            .unwrap();
        assert_eq!(status, PresenceStatus::Offline);
        // Reading must not create a phantom record.
        assert!(world
            .presence
            .find_by_user_id(&pso.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn broadcast_failure_propagates_to_caller() {
        let world = TestWorld::new();
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        world.broadcaster.fail_presence();
        let service = service(&world);

        let err = service
            .set_offline(&UserKey::ById(pso.id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Broadcast { .. }));
        // The state change itself still happened.
        let record = world.presence.find_by_user_id(&pso.id).await.unwrap();
        assert_eq!(record.unwrap().status, PresenceStatus::Offline);
    }
}
