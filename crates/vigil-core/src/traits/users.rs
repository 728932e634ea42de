// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the user directory.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::model::User;
use crate::types::{Role, UserId, UserKey};

/// Lookup operations over the externally managed user store.
///
/// Email lookups match case-insensitively.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, VigilError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, VigilError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, VigilError>;

    /// All users holding one of the given roles, with their supervisor
    /// reference populated.
    async fn find_by_roles_with_supervisor(
        &self,
        roles: &[Role],
    ) -> Result<Vec<User>, VigilError>;

    /// Resolve a user from an explicit tagged key, mapping a miss to
    /// [`VigilError::UserNotFound`].
    async fn resolve(&self, key: &UserKey) -> Result<User, VigilError> {
        let found = match key {
            UserKey::ById(id) => self.find_by_id(id).await?,
            UserKey::ByExternalId(ext) => self.find_by_external_id(ext).await?,
            UserKey::ByEmail(email) => self.find_by_email(email).await?,
        };
        found.ok_or_else(|| VigilError::UserNotFound {
            key: key.to_string(),
        })
    }
}
