// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vigil service tests.
//!
//! Provides in-memory repositories, mock collaborators, and a pre-wired
//! world for fast, deterministic, CI-runnable tests without external
//! services.
//!
//! # Components
//!
//! - In-memory stores for users, presence, commands, recordings, and talk
//!   sessions, enforcing the same invariants the production stores document
//! - [`MockEgress`] - scriptable media-egress client
//! - [`CapturingBroadcaster`] - records all sends, per-method failure injection
//! - [`MockBlobStore`], [`MockStreaming`], [`MockManagement`]
//! - [`TestWorld`] - one `Arc` of everything, pre-wired

pub mod harness;
pub mod memory_repos;
pub mod mock_broadcast;
pub mod mock_egress;
pub mod mock_services;

pub use harness::TestWorld;
pub use memory_repos::{
    InMemoryCommands, InMemoryPresence, InMemoryRecordings, InMemoryTalkSessions, InMemoryUsers,
};
pub use mock_broadcast::{CapturingBroadcaster, SentEvent};
pub use mock_egress::MockEgress;
pub use mock_services::{MockBlobStore, MockManagement, MockStreaming};
