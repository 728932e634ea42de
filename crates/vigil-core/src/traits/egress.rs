// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client interface to the external media-egress server.
//!
//! The media server reports failures in heterogeneous shapes; client
//! implementations normalize them into [`EgressError`] once at this
//! boundary so the recording orchestrator can match on typed variants
//! instead of inspecting raw status strings.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{EgressId, EgressStatus};

/// Result of successfully starting an egress job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressHandle {
    pub egress_id: EgressId,
    /// Object key the recording is written to in blob storage.
    pub object_key: String,
}

/// Result of successfully stopping an egress job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EgressStopResult {
    pub status: Option<EgressStatus>,
    /// Final recording URL when the media server reports one.
    pub blob_url: Option<String>,
}

/// Snapshot of an egress job's state, as reported by the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressInfo {
    pub egress_id: EgressId,
    pub status: EgressStatus,
    /// Server-side status detail, when present.
    pub detail: Option<String>,
    /// Raw error string attached by the media server, when present.
    pub error: Option<String>,
}

/// Normalized media-server failure.
#[derive(Debug, Error)]
pub enum EgressError {
    /// The egress does not exist or is no longer active. The stop path
    /// treats this as completion via disconnection.
    #[error("no active egress: {message}")]
    NotActive { message: String },

    /// The egress already ended in failure and cannot be stopped.
    #[error("egress already failed: {message}")]
    AlreadyFailed {
        status: Option<EgressStatus>,
        detail: Option<String>,
        message: String,
    },

    /// Network, protocol, or server-side failure.
    #[error("egress transport error: {message}")]
    Transport { message: String },
}

/// Operations against the media-egress server.
#[async_trait]
pub trait EgressClient: Send + Sync {
    /// Begin recording a room. The label annotates the job for operators.
    async fn start_egress(&self, room: &str, label: &str) -> Result<EgressHandle, EgressError>;

    /// Stop a recording job.
    async fn stop_egress(&self, egress_id: &EgressId) -> Result<EgressStopResult, EgressError>;

    /// Current state of a job; None when the server no longer knows it.
    async fn get_egress_info(
        &self,
        egress_id: &EgressId,
    ) -> Result<Option<EgressInfo>, EgressError>;
}
