// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-wired bundle of fake collaborators for service tests.
//!
//! `TestWorld` holds one `Arc` of every store and mock so a test can hand
//! the same instances to the service under test and to its assertions.
//! Service construction stays in the test: this crate only depends on
//! `vigil-core`, keeping the dependency graph acyclic.

use std::sync::Arc;

use vigil_core::model::User;
use vigil_core::types::Role;

use crate::memory_repos::{
    InMemoryCommands, InMemoryPresence, InMemoryRecordings, InMemoryTalkSessions, InMemoryUsers,
};
use crate::mock_broadcast::CapturingBroadcaster;
use crate::mock_egress::MockEgress;
use crate::mock_services::{MockBlobStore, MockManagement, MockStreaming};

/// All fake collaborators, shared via `Arc`.
pub struct TestWorld {
    pub users: Arc<InMemoryUsers>,
    pub presence: Arc<InMemoryPresence>,
    pub commands: Arc<InMemoryCommands>,
    pub recordings: Arc<InMemoryRecordings>,
    pub talk_sessions: Arc<InMemoryTalkSessions>,
    pub egress: Arc<MockEgress>,
    pub blobs: Arc<MockBlobStore>,
    pub broadcaster: Arc<CapturingBroadcaster>,
    pub streaming: Arc<MockStreaming>,
    pub management: Arc<MockManagement>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUsers::new()),
            presence: Arc::new(InMemoryPresence::new()),
            commands: Arc::new(InMemoryCommands::new()),
            recordings: Arc::new(InMemoryRecordings::new()),
            talk_sessions: Arc::new(InMemoryTalkSessions::new()),
            egress: Arc::new(MockEgress::new()),
            blobs: Arc::new(MockBlobStore::new()),
            broadcaster: Arc::new(CapturingBroadcaster::new()),
            streaming: Arc::new(MockStreaming::new()),
            management: Arc::new(MockManagement::new()),
        }
    }

    /// Seed a supervisor user.
    pub async fn supervisor(&self, email: &str, name: &str) -> User {
        self.users.seed(email, name, Role::Supervisor).await
    }

    /// Seed a field user reporting to the given supervisor.
    pub async fn field_user(&self, email: &str, name: &str, supervisor: &User) -> User {
        self.users
            .seed_with_supervisor(email, name, Role::FieldUser, supervisor)
            .await
    }

    /// Seed a field user without a supervisor.
    pub async fn lone_field_user(&self, email: &str, name: &str) -> User {
        self.users.seed(email, name, Role::FieldUser).await
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
