// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection domain service: the connect/disconnect cascade coordinator.

pub mod service;

pub use service::ConnectionService;
