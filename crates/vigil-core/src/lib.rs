// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vigil monitoring backend.
//!
//! This crate provides the error type, identifiers, domain entities, event
//! payloads, and collaborator traits used throughout the Vigil workspace.
//! The domain service crates build on these; repository, egress, blob, and
//! messaging implementations are injected from outside the core.

pub mod best_effort;
pub mod error;
pub mod events;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use best_effort::best_effort;
pub use error::VigilError;
pub use types::{
    CommandId, CommandType, DeliveryStatus, EgressId, EgressStatus, PresenceStatus,
    RecordingSessionId, RecordingStatus, Role, StreamStopReason, SupervisorChangeKind,
    TalkSessionId, TalkStopReason, UserId, UserKey,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    BlobStore, Broadcaster, EgressClient, PendingCommandRepository, PresenceRepository,
    RecordingSessionRepository, StreamingSessions, TalkSessionRepository, UserManagement,
    UserRepository,
};
