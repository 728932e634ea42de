// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payloads emitted on the broadcast and messaging channels.
//!
//! These serialize camelCase because the consuming dashboard and device
//! clients speak that convention on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CommandId, CommandType, PresenceStatus, Role, SupervisorChangeKind, TalkSessionId, UserId,
};

/// Presence change fanned out to all dashboard observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    pub email: String,
    pub full_name: String,
    pub status: PresenceStatus,
    pub last_seen_at: DateTime<Utc>,
    pub role: Role,
    pub supervisor_id: Option<UserId>,
    pub supervisor_email: Option<String>,
}

/// Streaming-session UI event accompanying a Start/Stop command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub email: String,
    /// "started" or "stopped".
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StreamEvent {
    pub fn started(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: "started".to_string(),
            reason: None,
        }
    }

    pub fn stopped(email: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            email: email.into(),
            status: "stopped".to_string(),
            reason,
        }
    }
}

/// Sent to a PSO's channel when a supervisor opens a talk session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkStartEvent {
    pub talk_session_id: TalkSessionId,
    pub supervisor_email: String,
    pub supervisor_name: String,
}

/// Sent to a PSO's channel when their talk session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkStopEvent {
    pub pso_email: String,
}

/// Command published to a device group (`commands:<email>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    pub command_id: CommandId,
    pub command: CommandType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Per-recipient notice that their supervisor changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorChangeNotice {
    /// Display name of the new supervisor; None when unassigned.
    pub supervisor_name: Option<String>,
}

/// Aggregate dashboard refresh after a supervisor reassignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorChangeBroadcast {
    pub emails: Vec<String>,
    pub names: Vec<String>,
    pub supervisor_external_id: Option<String>,
    pub supervisor_name: Option<String>,
    pub kind: SupervisorChangeKind,
}

/// Well-known event names used on the broadcast channels.
pub mod event_names {
    /// A supervisor opened a talk session toward a PSO.
    pub const TALK_SESSION_START: &str = "talk_session_start";
    /// A PSO's talk session ended.
    pub const TALK_SESSION_STOP: &str = "talk_session_stop";
}
