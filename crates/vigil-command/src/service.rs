// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command dispatch: durability first, delivery best-effort.
//!
//! Every request persists a PendingCommand before anything else; that row
//! is the replay source when the target is offline. Immediate delivery is
//! attempted only when the target is currently online, and a delivery
//! failure never fails the operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use vigil_config::MessagingConfig;
use vigil_core::events::{CommandEnvelope, StreamEvent};
use vigil_core::model::PendingCommand;
use vigil_core::traits::{
    Broadcaster, PendingCommandRepository, StreamingSessions, UserRepository,
};
use vigil_core::types::{
    CommandId, CommandType, DeliveryStatus, PresenceStatus, StreamStopReason, UserKey,
};
use vigil_core::{best_effort, VigilError};
use vigil_presence::PresenceService;

/// Result of a command request.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReceipt {
    pub command_id: CommandId,
    /// Whether the command was published to the device group immediately.
    pub delivered: bool,
    pub message: String,
}

/// Owns command creation and best-effort immediate delivery.
pub struct CommandService {
    users: Arc<dyn UserRepository>,
    commands: Arc<dyn PendingCommandRepository>,
    presence: Arc<PresenceService>,
    streaming: Arc<dyn StreamingSessions>,
    broadcaster: Arc<dyn Broadcaster>,
    messaging: MessagingConfig,
}

impl CommandService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        commands: Arc<dyn PendingCommandRepository>,
        presence: Arc<PresenceService>,
        streaming: Arc<dyn StreamingSessions>,
        broadcaster: Arc<dyn Broadcaster>,
        messaging: MessagingConfig,
    ) -> Self {
        Self {
            users,
            commands,
            presence,
            streaming,
            broadcaster,
            messaging,
        }
    }

    /// Process a command for a target user, keyed by email.
    pub async fn process(
        &self,
        target_email: &str,
        command: CommandType,
        issued_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<CommandReceipt, VigilError> {
        let user = self
            .users
            .resolve(&UserKey::ByEmail(target_email.to_string()))
            .await?;
        if command == CommandType::Stop && reason.is_none() {
            return Err(VigilError::Validation(
                "a reason is required for Stop commands".into(),
            ));
        }

        // Durability first: the row exists regardless of what delivery does.
        let pending = PendingCommand {
            id: CommandId::generate(),
            user_id: user.id.clone(),
            command,
            reason: reason.clone(),
            created_at: issued_at,
            delivery: DeliveryStatus::Pending,
        };
        self.commands.create(pending.clone()).await?;

        match command {
            CommandType::Start => {
                best_effort("streaming session start", self.streaming.start(&user.id)).await;
                best_effort(
                    "stream started event",
                    self.broadcast_stream_event(&user.email, StreamEvent::started(&user.email)),
                )
                .await;
            }
            CommandType::Stop => {
                best_effort(
                    "streaming session stop",
                    self.streaming.stop(&user.id, StreamStopReason::Command),
                )
                .await;
                best_effort(
                    "stream stopped event",
                    self.broadcast_stream_event(
                        &user.email,
                        StreamEvent::stopped(&user.email, reason.clone()),
                    ),
                )
                .await;
            }
            CommandType::Refresh => {}
        }

        let delivered = self.try_deliver(&user.email, &pending).await;
        if delivered {
            debug!(command = %pending.id, target = %user.email, "command delivered immediately");
        } else {
            debug!(command = %pending.id, target = %user.email, "command stored for replay");
        }

        Ok(CommandReceipt {
            command_id: pending.id,
            delivered,
            message: if delivered {
                format!("{command} command delivered to {}", user.email)
            } else {
                format!("{command} command stored; {} is offline", user.email)
            },
        })
    }

    /// Publish to the device group and mark the row Published, but only
    /// when the target is online. Any failure leaves the row Pending.
    async fn try_deliver(&self, email: &str, pending: &PendingCommand) -> bool {
        let status = best_effort(
            "presence check before delivery",
            self.presence
                .get_status(&UserKey::ById(pending.user_id.clone())),
        )
        .await
        .unwrap_or(PresenceStatus::Offline);
        if status != PresenceStatus::Online {
            return false;
        }

        let group = self.messaging.command_group(email);
        let envelope = CommandEnvelope {
            command_id: pending.id.clone(),
            command: pending.command,
            reason: pending.reason.clone(),
            issued_at: pending.created_at,
        };
        let publish = async {
            let payload = serde_json::to_value(&envelope)
                .map_err(|e| VigilError::Internal(e.to_string()))?;
            self.broadcaster.send_to_group(&group, payload).await?;
            self.commands.mark_published(&pending.id).await
        };
        best_effort("command publish", publish).await.is_some()
    }

    async fn broadcast_stream_event(
        &self,
        email: &str,
        event: StreamEvent,
    ) -> Result<(), VigilError> {
        let payload =
            serde_json::to_value(&event).map_err(|e| VigilError::Internal(e.to_string()))?;
        self.broadcaster.broadcast_message(email, payload).await
    }
}
