// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence store: current record plus online/offline history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VigilError;
use crate::model::PresenceRecord;
use crate::types::{PresenceStatus, UserId};

/// Persistence for presence records and history intervals.
///
/// Implementations must keep exactly one current record per user (upsert
/// supersedes, never duplicates) and at most one open history row per user.
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// Create or replace the user's current presence record.
    async fn upsert_presence(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Open a new history interval for the user.
    async fn open_history(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), VigilError>;

    /// Close the user's open history interval. No-op when none is open.
    async fn close_open_history(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PresenceRecord>, VigilError>;
}
