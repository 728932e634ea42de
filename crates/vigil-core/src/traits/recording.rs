// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording-session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VigilError;
use crate::model::{NewRecordingSession, RecordingSession};
use crate::types::{RecordingSessionId, UserId};

/// Persistence for recording sessions.
///
/// Completed and Failed are terminal; implementations never reopen a row.
#[async_trait]
pub trait RecordingSessionRepository: Send + Sync {
    /// Persist a new Active session and return it with its assigned id.
    async fn create_active(
        &self,
        session: NewRecordingSession,
    ) -> Result<RecordingSession, VigilError>;

    async fn find_by_id(
        &self,
        id: &RecordingSessionId,
    ) -> Result<Option<RecordingSession>, VigilError>;

    /// Active sessions recording the given room.
    async fn find_active_by_room(&self, room: &str) -> Result<Vec<RecordingSession>, VigilError>;

    /// Active sessions whose recorded subject is the given user.
    async fn find_active_by_subject(
        &self,
        subject_id: &UserId,
    ) -> Result<Vec<RecordingSession>, VigilError>;

    /// Transition a session to Completed with its final blob URL.
    async fn complete(
        &self,
        id: &RecordingSessionId,
        stopped_at: DateTime<Utc>,
        blob_url: Option<String>,
    ) -> Result<(), VigilError>;

    /// Transition a session to Failed.
    async fn fail(
        &self,
        id: &RecordingSessionId,
        stopped_at: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Delete the row. Returns false when no row existed.
    async fn delete_by_id(&self, id: &RecordingSessionId) -> Result<bool, VigilError>;
}
