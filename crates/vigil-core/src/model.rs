// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities persisted by the repository collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CommandId, CommandType, DeliveryStatus, EgressId, PresenceStatus, RecordingSessionId,
    RecordingStatus, Role, SupervisorChangeKind, TalkSessionId, TalkStopReason, UserId,
};

/// A platform user. Created externally; this core only reads users and
/// updates their supervisor reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Identifier in the external identity directory.
    pub external_id: String,
    /// Case-insensitive lookup key; stored lowercased.
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub supervisor_id: Option<UserId>,
}

/// Current presence of a user. Exactly one record per user; superseded on
/// every transition, never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub user_id: UserId,
    pub status: PresenceStatus,
    pub last_seen_at: DateTime<Utc>,
}

/// One online interval. Opened when a user goes online, closed when they go
/// offline. At most one open entry per user at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceHistoryEntry {
    pub user_id: UserId,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
}

/// Durable record of a requested device command. Created on every request
/// regardless of delivery outcome; replayed when an offline target
/// reconnects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub id: CommandId,
    pub user_id: UserId,
    pub command: CommandType,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivery: DeliveryStatus,
}

/// A recording job tracked against the external media-egress server.
/// Terminal once Completed or Failed; a new start creates a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSession {
    pub id: RecordingSessionId,
    /// Media room being recorded; generally the subject user's email.
    pub room: String,
    pub egress_id: EgressId,
    pub initiated_by: UserId,
    pub subject_id: Option<UserId>,
    pub subject_label: String,
    pub status: RecordingStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub blob_path: Option<String>,
    pub blob_url: Option<String>,
}

/// Creation payload for an Active recording session row.
#[derive(Debug, Clone)]
pub struct NewRecordingSession {
    pub room: String,
    pub egress_id: EgressId,
    pub initiated_by: UserId,
    pub subject_id: Option<UserId>,
    pub subject_label: String,
    pub started_at: DateTime<Utc>,
    pub blob_path: Option<String>,
}

/// An exclusive supervisor-to-PSO audio channel. At most one session per
/// PSO may be open (stopped_at = None) at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkSession {
    pub id: TalkSessionId,
    pub supervisor_id: UserId,
    pub pso_id: UserId,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<TalkStopReason>,
}

impl TalkSession {
    /// True while the session has not been stopped.
    pub fn is_open(&self) -> bool {
        self.stopped_at.is_none()
    }
}

/// Creation payload for a talk session.
#[derive(Debug, Clone)]
pub struct NewTalkSession {
    pub supervisor_id: UserId,
    pub pso_id: UserId,
    pub started_at: DateTime<Utc>,
}

/// Ephemeral reassignment request. The durable effect is the supervisor
/// reference on each target user.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorAssignment {
    /// Emails of the users whose supervisor changes.
    pub emails: Vec<String>,
    /// New supervisor email; None when unassigning.
    pub new_supervisor_email: Option<String>,
    pub kind: SupervisorChangeKind,
    pub requested_at: DateTime<Utc>,
}
