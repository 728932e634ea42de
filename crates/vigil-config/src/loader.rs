// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, then `./vigil.toml`, then `VIGIL_*`
//! environment variable overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VigilConfig;

/// Load configuration from `./vigil.toml` with env var overrides.
pub fn load_config() -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file("vigil.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping. `Env::split("_")` would mis-split keys that
/// themselves contain underscores, e.g. `VIGIL_RECORDING_SAS_URL_MINUTES`
/// must map to `recording.sas_url_minutes`.
fn env_provider() -> Env {
    Env::prefixed("VIGIL_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("recording_", "recording.", 1)
            .replacen("messaging_", "messaging.", 1);
        mapped.into()
    })
}
