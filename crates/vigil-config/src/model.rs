// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vigil monitoring backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Vigil configuration.
///
/// Loaded from `vigil.toml` with `VIGIL_*` environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    /// Recording orchestration settings.
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Messaging and group-naming settings.
    #[serde(default)]
    pub messaging: MessagingConfig,
}

/// Recording orchestration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecordingConfig {
    /// Delay before the deferred egress-failure check runs, in milliseconds.
    #[serde(default = "default_egress_check_delay_ms")]
    pub egress_check_delay_ms: u64,

    /// Lifetime of signed playback URLs, in minutes. Clamped to at least
    /// one minute at use.
    #[serde(default = "default_sas_url_minutes")]
    pub sas_url_minutes: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            egress_check_delay_ms: default_egress_check_delay_ms(),
            sas_url_minutes: default_sas_url_minutes(),
        }
    }
}

fn default_egress_check_delay_ms() -> u64 {
    5_000
}

fn default_sas_url_minutes() -> u32 {
    60
}

/// Messaging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessagingConfig {
    /// Prefix for per-user device command groups
    /// (`<prefix>:<lowercased email>`).
    #[serde(default = "default_command_group_prefix")]
    pub command_group_prefix: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            command_group_prefix: default_command_group_prefix(),
        }
    }
}

impl MessagingConfig {
    /// Device command group for a target email.
    pub fn command_group(&self, email: &str) -> String {
        format!("{}:{}", self.command_group_prefix, email.to_lowercase())
    }
}

fn default_command_group_prefix() -> String {
    "commands".to_string()
}
