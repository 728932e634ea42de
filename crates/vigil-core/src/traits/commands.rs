// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store for pending device commands.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::model::PendingCommand;
use crate::types::CommandId;

/// Persistence for the store-and-forward command queue.
///
/// Rows are created Pending on every command request and only ever mutated
/// to Published after a confirmed send; a separate replay path drains
/// Pending rows when the target reconnects.
#[async_trait]
pub trait PendingCommandRepository: Send + Sync {
    async fn create(&self, command: PendingCommand) -> Result<(), VigilError>;

    async fn mark_published(&self, id: &CommandId) -> Result<(), VigilError>;
}
