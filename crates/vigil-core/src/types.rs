// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers, enums, and lookup keys shared across the Vigil workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Internal identifier of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a pending command row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

/// Identifier of a recording session row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingSessionId(pub String);

/// Identifier of a talk session row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TalkSessionId(pub String);

/// Identifier assigned by the media-egress server to a recording job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EgressId(pub String);

impl UserId {
    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl CommandId {
    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl RecordingSessionId {
    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl TalkSessionId {
    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RecordingSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for TalkSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for EgressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit tagged lookup key for resolving a user.
///
/// The caller states which identifier it holds; the repository dispatches on
/// the tag. Email lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    ById(UserId),
    ByExternalId(String),
    ByEmail(String),
}

impl UserKey {
    /// True when the underlying identifier string is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            UserKey::ById(id) => id.0.trim().is_empty(),
            UserKey::ByExternalId(ext) => ext.trim().is_empty(),
            UserKey::ByEmail(email) => email.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserKey::ById(id) => write!(f, "id:{id}"),
            UserKey::ByExternalId(ext) => write!(f, "external:{ext}"),
            UserKey::ByEmail(email) => write!(f, "email:{email}"),
        }
    }
}

/// Platform roles. Field users ("PSOs") are the monitored side; supervisors
/// issue commands to and talk to them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Role {
    SuperAdmin,
    Admin,
    Supervisor,
    FieldUser,
    ContactManager,
    Unassigned,
}

impl Role {
    /// Roles allowed to own talk sessions and receive supervisor duties.
    pub fn is_supervisor_capable(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::Supervisor)
    }
}

/// Online/offline presence state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Commands deliverable to a field user's device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum CommandType {
    Start,
    Stop,
    Refresh,
}

/// Delivery state of a pending command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum DeliveryStatus {
    Pending,
    Published,
    Failed,
}

/// Lifecycle state of a recording session. Terminal once Completed or Failed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum RecordingStatus {
    Active,
    Completed,
    Failed,
}

/// Why a talk session ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum TalkStopReason {
    UserInitiated,
    SupervisorDisconnected,
    PsoDisconnected,
}

/// Why a streaming session was stopped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum StreamStopReason {
    Disconnect,
    Manual,
    Command,
}

/// Direction of a supervisor reassignment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum SupervisorChangeKind {
    Assign,
    Unassign,
}

/// Egress job states as reported by the media server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum EgressStatus {
    Starting,
    Active,
    Ending,
    Complete,
    Failed,
    Aborted,
}

impl EgressStatus {
    /// True for states that mean the egress job ended without a usable
    /// recording.
    pub fn is_failure(self) -> bool {
        matches!(self, EgressStatus::Failed | EgressStatus::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn generated_ids_are_unique() {
        let a = RecordingSessionId::generate();
        let b = RecordingSessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn user_key_blank_detection() {
        assert!(UserKey::ByEmail("  ".into()).is_blank());
        assert!(UserKey::ById(UserId(String::new())).is_blank());
        assert!(!UserKey::ByExternalId("ext-1".into()).is_blank());
    }

    #[test]
    fn supervisor_capable_roles() {
        assert!(Role::SuperAdmin.is_supervisor_capable());
        assert!(Role::Admin.is_supervisor_capable());
        assert!(Role::Supervisor.is_supervisor_capable());
        assert!(!Role::FieldUser.is_supervisor_capable());
        assert!(!Role::ContactManager.is_supervisor_capable());
        assert!(!Role::Unassigned.is_supervisor_capable());
    }

    #[test]
    fn enums_round_trip_through_strings() {
        for status in [EgressStatus::Failed, EgressStatus::Complete] {
            let parsed = EgressStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(
            TalkStopReason::from_str("SupervisorDisconnected").unwrap(),
            TalkStopReason::SupervisorDisconnected
        );
    }

    #[test]
    fn egress_failure_states() {
        assert!(EgressStatus::Failed.is_failure());
        assert!(EgressStatus::Aborted.is_failure());
        assert!(!EgressStatus::Complete.is_failure());
        assert!(!EgressStatus::Active.is_failure());
    }
}
