// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence domain service: online/offline transitions, history, and
//! presence broadcast fan-out.

pub mod service;

pub use service::PresenceService;
