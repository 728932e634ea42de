// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming-session manager for field-user video feeds.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::types::{StreamStopReason, UserId};

/// Start/stop control over a user's live streaming session.
#[async_trait]
pub trait StreamingSessions: Send + Sync {
    async fn start(&self, user_id: &UserId) -> Result<(), VigilError>;

    /// Stop the user's active streaming session, if any.
    async fn stop(&self, user_id: &UserId, reason: StreamStopReason) -> Result<(), VigilError>;
}
