// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-management service consumed by supervisor reassignment.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::model::User;
use crate::types::UserId;

/// Administrative operations delegated to the management layer.
#[async_trait]
pub trait UserManagement: Send + Sync {
    /// Whether the user is eligible to have its supervisor changed
    /// (excludes e.g. terminated accounts).
    async fn can_change_supervisor(&self, user: &User) -> Result<bool, VigilError>;

    /// Bulk-update the supervisor reference on every user in `emails`.
    /// Returns the number of affected rows.
    async fn reassign_supervisor(
        &self,
        emails: &[String],
        new_supervisor: Option<UserId>,
    ) -> Result<u64, VigilError>;
}
