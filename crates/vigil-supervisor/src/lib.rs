// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor application service: reassignment validation, bulk update,
//! and notification fan-out.

pub mod service;

pub use service::{ChangeOutcome, SupervisorService};
