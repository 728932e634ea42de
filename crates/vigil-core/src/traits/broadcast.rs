// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out messaging toward dashboards and device groups.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::VigilError;
use crate::events::{PresenceUpdate, SupervisorChangeBroadcast};

/// The broadcast/messaging hub.
///
/// Sends are fire-and-forget from the services' perspective: callers decide
/// per call site whether a failure propagates or is swallowed via
/// `best_effort`. The hub itself never retries.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish to a named device group (e.g. `commands:<email>`).
    async fn send_to_group(&self, group: &str, payload: Value) -> Result<(), VigilError>;

    /// Fan a presence change out to all dashboard observers.
    async fn broadcast_presence(&self, update: PresenceUpdate) -> Result<(), VigilError>;

    /// Publish a named event to a user-keyed channel.
    async fn broadcast_message(&self, channel: &str, payload: Value) -> Result<(), VigilError>;

    /// Fan a supervisor reassignment out to all dashboard observers.
    async fn broadcast_supervisor_change(
        &self,
        change: SupervisorChangeBroadcast,
    ) -> Result<(), VigilError>;

    /// Reconcile every connected client against the source of truth.
    /// Call sites treat this as best-effort.
    async fn sync_all_users(&self) -> Result<(), VigilError>;
}
