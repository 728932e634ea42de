// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Talk-session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VigilError;
use crate::model::{NewTalkSession, TalkSession};
use crate::types::{TalkSessionId, TalkStopReason, UserId};

/// Persistence for exclusive supervisor-to-PSO talk sessions.
///
/// The at-most-one-open-session-per-PSO invariant is enforced here: `create`
/// must surface [`VigilError::TalkSessionActive`] when the PSO already has
/// an open session, even under concurrent creates. The service layer also
/// checks first to produce a richer conflict message, but the store is the
/// backstop.
#[async_trait]
pub trait TalkSessionRepository: Send + Sync {
    async fn create(&self, session: NewTalkSession) -> Result<TalkSession, VigilError>;

    async fn find_by_id(&self, id: &TalkSessionId) -> Result<Option<TalkSession>, VigilError>;

    /// Open sessions where the given user is the PSO side.
    async fn find_active_by_pso(&self, pso_id: &UserId) -> Result<Vec<TalkSession>, VigilError>;

    /// Open sessions owned by the given supervisor.
    async fn find_active_by_supervisor(
        &self,
        supervisor_id: &UserId,
    ) -> Result<Vec<TalkSession>, VigilError>;

    /// Persist the stop. Stopped sessions are terminal.
    async fn stop(
        &self,
        id: &TalkSessionId,
        reason: TalkStopReason,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError>;
}
