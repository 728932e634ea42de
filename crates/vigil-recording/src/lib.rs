// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording-session orchestration for the Vigil monitoring backend.
//!
//! Drives the `Active -> {Completed | Failed}` lifecycle against the
//! external media-egress server, including the deferred failure check and
//! blob cleanup.

pub mod orchestrator;
pub mod watch;

pub use orchestrator::{DeleteOutcome, RecordingOrchestrator, StopAllSummary, StopOutcome};
pub use watch::EgressWatch;
