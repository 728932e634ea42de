// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory repository implementations for deterministic testing.
//!
//! Each store keeps its rows behind a `tokio::sync::Mutex` and enforces the
//! same data-layer invariants the production stores document: one current
//! presence record per user, at most one open talk session per PSO.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use vigil_core::model::{
    NewRecordingSession, NewTalkSession, PendingCommand, PresenceHistoryEntry, PresenceRecord,
    RecordingSession, TalkSession, User,
};
use vigil_core::traits::{
    PendingCommandRepository, PresenceRepository, RecordingSessionRepository,
    TalkSessionRepository, UserRepository,
};
use vigil_core::types::{
    CommandId, DeliveryStatus, PresenceStatus, RecordingSessionId, RecordingStatus, Role,
    TalkSessionId, TalkStopReason, UserId,
};
use vigil_core::VigilError;

/// In-memory user directory.
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.lock().await.push(user);
    }

    /// Seed a user with generated id/external id derived from the email.
    pub async fn seed(&self, email: &str, display_name: &str, role: Role) -> User {
        let user = User {
            id: UserId::generate(),
            external_id: format!("ext-{email}"),
            email: email.to_lowercase(),
            display_name: display_name.to_string(),
            role,
            supervisor_id: None,
        };
        self.insert(user.clone()).await;
        user
    }

    /// Remove a user from the directory.
    pub async fn remove(&self, id: &UserId) {
        self.users.lock().await.retain(|u| &u.id != id);
    }

    /// Seed a field user reporting to the given supervisor.
    pub async fn seed_with_supervisor(
        &self,
        email: &str,
        display_name: &str,
        role: Role,
        supervisor: &User,
    ) -> User {
        let mut user = self.seed(email, display_name, role).await;
        user.supervisor_id = Some(supervisor.id.clone());
        let mut users = self.users.lock().await;
        if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
            stored.supervisor_id = Some(supervisor.id.clone());
        }
        user
    }
}

impl Default for InMemoryUsers {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, VigilError> {
        Ok(self.users.lock().await.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, VigilError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, VigilError> {
        let needle = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.email == needle)
            .cloned())
    }

    async fn find_by_roles_with_supervisor(
        &self,
        roles: &[Role],
    ) -> Result<Vec<User>, VigilError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .filter(|u| roles.contains(&u.role))
            .cloned()
            .collect())
    }
}

/// In-memory presence store with history.
pub struct InMemoryPresence {
    records: Mutex<HashMap<UserId, PresenceRecord>>,
    history: Mutex<Vec<PresenceHistoryEntry>>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// All history entries for a user, in insertion order.
    pub async fn history_for(&self, user_id: &UserId) -> Vec<PresenceHistoryEntry> {
        self.history
            .lock()
            .await
            .iter()
            .filter(|h| &h.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of open (exited_at = None) history entries for a user.
    pub async fn open_history_count(&self, user_id: &UserId) -> usize {
        self.history
            .lock()
            .await
            .iter()
            .filter(|h| &h.user_id == user_id && h.exited_at.is_none())
            .count()
    }
}

impl Default for InMemoryPresence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresence {
    async fn upsert_presence(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.records.lock().await.insert(
            user_id.clone(),
            PresenceRecord {
                user_id: user_id.clone(),
                status,
                last_seen_at: at,
            },
        );
        Ok(())
    }

    async fn open_history(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), VigilError> {
        self.history.lock().await.push(PresenceHistoryEntry {
            user_id: user_id.clone(),
            entered_at: at,
            exited_at: None,
        });
        Ok(())
    }

    async fn close_open_history(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        let mut history = self.history.lock().await;
        for entry in history.iter_mut().rev() {
            if &entry.user_id == user_id && entry.exited_at.is_none() {
                entry.exited_at = Some(at);
                break;
            }
        }
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PresenceRecord>, VigilError> {
        Ok(self.records.lock().await.get(user_id).cloned())
    }
}

/// In-memory pending-command store.
pub struct InMemoryCommands {
    rows: Mutex<Vec<PendingCommand>>,
}

impl InMemoryCommands {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub async fn all(&self) -> Vec<PendingCommand> {
        self.rows.lock().await.clone()
    }
}

impl Default for InMemoryCommands {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingCommandRepository for InMemoryCommands {
    async fn create(&self, command: PendingCommand) -> Result<(), VigilError> {
        self.rows.lock().await.push(command);
        Ok(())
    }

    async fn mark_published(&self, id: &CommandId) -> Result<(), VigilError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| VigilError::storage(format!("no pending command {id}")))?;
        row.delivery = DeliveryStatus::Published;
        Ok(())
    }
}

/// In-memory recording-session store with optional failure injection.
pub struct InMemoryRecordings {
    rows: Mutex<Vec<RecordingSession>>,
    fail_next_complete: AtomicBool,
}

impl InMemoryRecordings {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_next_complete: AtomicBool::new(false),
        }
    }

    pub async fn all(&self) -> Vec<RecordingSession> {
        self.rows.lock().await.clone()
    }

    pub async fn get(&self, id: &RecordingSessionId) -> Option<RecordingSession> {
        self.rows.lock().await.iter().find(|s| &s.id == id).cloned()
    }

    /// Make the next `complete` call fail with a storage error.
    pub fn fail_next_complete(&self) {
        self.fail_next_complete.store(true, Ordering::SeqCst);
    }
}

impl Default for InMemoryRecordings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordingSessionRepository for InMemoryRecordings {
    async fn create_active(
        &self,
        session: NewRecordingSession,
    ) -> Result<RecordingSession, VigilError> {
        let row = RecordingSession {
            id: RecordingSessionId::generate(),
            room: session.room,
            egress_id: session.egress_id,
            initiated_by: session.initiated_by,
            subject_id: session.subject_id,
            subject_label: session.subject_label,
            status: RecordingStatus::Active,
            started_at: session.started_at,
            stopped_at: None,
            blob_path: session.blob_path,
            blob_url: None,
        };
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(
        &self,
        id: &RecordingSessionId,
    ) -> Result<Option<RecordingSession>, VigilError> {
        Ok(self.get(id).await)
    }

    async fn find_active_by_room(&self, room: &str) -> Result<Vec<RecordingSession>, VigilError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|s| s.room == room && s.status == RecordingStatus::Active)
            .cloned()
            .collect())
    }

    async fn find_active_by_subject(
        &self,
        subject_id: &UserId,
    ) -> Result<Vec<RecordingSession>, VigilError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|s| {
                s.subject_id.as_ref() == Some(subject_id) && s.status == RecordingStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn complete(
        &self,
        id: &RecordingSessionId,
        stopped_at: DateTime<Utc>,
        blob_url: Option<String>,
    ) -> Result<(), VigilError> {
        if self.fail_next_complete.swap(false, Ordering::SeqCst) {
            return Err(VigilError::storage("injected complete failure"));
        }
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| VigilError::storage(format!("no recording session {id}")))?;
        row.status = RecordingStatus::Completed;
        row.stopped_at = Some(stopped_at);
        row.blob_url = blob_url;
        Ok(())
    }

    async fn fail(
        &self,
        id: &RecordingSessionId,
        stopped_at: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| VigilError::storage(format!("no recording session {id}")))?;
        row.status = RecordingStatus::Failed;
        row.stopped_at = Some(stopped_at);
        Ok(())
    }

    async fn delete_by_id(&self, id: &RecordingSessionId) -> Result<bool, VigilError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|s| &s.id != id);
        Ok(rows.len() < before)
    }
}

/// In-memory talk-session store enforcing the one-open-session-per-PSO
/// invariant at create time.
pub struct InMemoryTalkSessions {
    rows: Mutex<Vec<TalkSession>>,
}

impl InMemoryTalkSessions {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub async fn all(&self) -> Vec<TalkSession> {
        self.rows.lock().await.clone()
    }

    pub async fn get(&self, id: &TalkSessionId) -> Option<TalkSession> {
        self.rows.lock().await.iter().find(|s| &s.id == id).cloned()
    }
}

impl Default for InMemoryTalkSessions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TalkSessionRepository for InMemoryTalkSessions {
    async fn create(&self, session: NewTalkSession) -> Result<TalkSession, VigilError> {
        // Check-and-insert under the same lock: the conflict surfaces even
        // for concurrent creates.
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|s| s.pso_id == session.pso_id && s.is_open()) {
            return Err(VigilError::TalkSessionActive {
                pso: session.pso_id.to_string(),
                owner: None,
            });
        }
        let row = TalkSession {
            id: TalkSessionId::generate(),
            supervisor_id: session.supervisor_id,
            pso_id: session.pso_id,
            started_at: session.started_at,
            stopped_at: None,
            stop_reason: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: &TalkSessionId) -> Result<Option<TalkSession>, VigilError> {
        Ok(self.get(id).await)
    }

    async fn find_active_by_pso(&self, pso_id: &UserId) -> Result<Vec<TalkSession>, VigilError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|s| &s.pso_id == pso_id && s.is_open())
            .cloned()
            .collect())
    }

    async fn find_active_by_supervisor(
        &self,
        supervisor_id: &UserId,
    ) -> Result<Vec<TalkSession>, VigilError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|s| &s.supervisor_id == supervisor_id && s.is_open())
            .cloned()
            .collect())
    }

    async fn stop(
        &self,
        id: &TalkSessionId,
        reason: TalkStopReason,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| VigilError::storage(format!("no talk session {id}")))?;
        if row.stopped_at.is_none() {
            row.stopped_at = Some(at);
            row.stop_reason = Some(reason);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let users = InMemoryUsers::new();
        users.seed("PSO@Example.com", "Pat Soto", Role::FieldUser).await;

        let found = users.find_by_email("pso@EXAMPLE.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn resolve_dispatches_on_the_key_tag() {
        use vigil_core::types::UserKey;

        let users = InMemoryUsers::new();
        let user = users.seed("pso@example.com", "Pat Soto", Role::FieldUser).await;

        let by_id = users.resolve(&UserKey::ById(user.id.clone())).await.unwrap();
        assert_eq!(by_id.id, user.id);
        let by_ext = users
            .resolve(&UserKey::ByExternalId(user.external_id.clone()))
            .await
            .unwrap();
        assert_eq!(by_ext.id, user.id);
        let by_email = users
            .resolve(&UserKey::ByEmail("pso@example.com".into()))
            .await
            .unwrap();
        assert_eq!(by_email.id, user.id);

        // A key only matches through its own tag: an email wrapped in the
        // external-id tag is a miss, not a fallback.
        let err = users
            .resolve(&UserKey::ByExternalId("pso@example.com".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn talk_store_rejects_second_open_session_for_pso() {
        let store = InMemoryTalkSessions::new();
        let pso = UserId::generate();
        let first = store
            .create(NewTalkSession {
                supervisor_id: UserId::generate(),
                pso_id: pso.clone(),
                started_at: Utc::now(),
            })
            .await
            .unwrap();

        let second = store
            .create(NewTalkSession {
                supervisor_id: UserId::generate(),
                pso_id: pso.clone(),
                started_at: Utc::now(),
            })
            .await;
        assert!(matches!(
            second,
            Err(VigilError::TalkSessionActive { .. })
        ));

        // First session untouched.
        assert!(store.get(&first.id).await.unwrap().is_open());
    }

    #[tokio::test]
    async fn role_query_filters_and_keeps_supervisor_reference() {
        let users = InMemoryUsers::new();
        let sup = users.seed("sup@example.com", "Sam Soto", Role::Supervisor).await;
        users
            .seed_with_supervisor("pso@example.com", "Pat Field", Role::FieldUser, &sup)
            .await;
        users.seed("admin@example.com", "Ada Admin", Role::Admin).await;

        let field_users = users
            .find_by_roles_with_supervisor(&[Role::FieldUser])
            .await
            .unwrap();
        assert_eq!(field_users.len(), 1);
        assert_eq!(field_users[0].supervisor_id, Some(sup.id.clone()));

        let staff = users
            .find_by_roles_with_supervisor(&[Role::Supervisor, Role::Admin])
            .await
            .unwrap();
        assert_eq!(staff.len(), 2);
    }

    #[tokio::test]
    async fn close_open_history_is_noop_without_open_entry() {
        let presence = InMemoryPresence::new();
        let user = UserId::generate();
        presence.close_open_history(&user, Utc::now()).await.unwrap();
        assert!(presence.history_for(&user).await.is_empty());
    }
}
