// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command domain service: durable device commands with store-and-forward
//! delivery.

pub mod service;

pub use service::{CommandReceipt, CommandService};
