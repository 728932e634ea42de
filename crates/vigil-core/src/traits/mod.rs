// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the domain services.
//!
//! Repositories are CRUD-only: business rules live in the services, except
//! for the data-layer invariants each trait documents. Implementations are
//! out of scope for this core and injected at construction time.

pub mod blob;
pub mod broadcast;
pub mod commands;
pub mod egress;
pub mod management;
pub mod presence;
pub mod recording;
pub mod streaming;
pub mod talk;
pub mod users;

pub use blob::BlobStore;
pub use broadcast::Broadcaster;
pub use commands::PendingCommandRepository;
pub use egress::{EgressClient, EgressError, EgressHandle, EgressInfo, EgressStopResult};
pub use management::UserManagement;
pub use presence::PresenceRepository;
pub use recording::RecordingSessionRepository;
pub use streaming::StreamingSessions;
pub use talk::TalkSessionRepository;
pub use users::UserRepository;
