// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Talk-session domain service: exclusive supervisor-to-PSO audio channels.

pub mod service;

pub use service::{TalkService, TalkStartReceipt};
