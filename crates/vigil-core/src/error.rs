// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vigil orchestration core.

use thiserror::Error;

use crate::traits::egress::EgressError;
use crate::types::{RecordingSessionId, TalkSessionId};

/// The primary error type used across all Vigil domain services.
#[derive(Debug, Error)]
pub enum VigilError {
    /// No user resolved for the given lookup key.
    #[error("user not found: {key}")]
    UserNotFound { key: String },

    /// Recording session does not exist.
    #[error("recording session not found: {id}")]
    RecordingNotFound { id: RecordingSessionId },

    /// Talk session does not exist.
    #[error("talk session not found: {id}")]
    TalkSessionNotFound { id: TalkSessionId },

    /// The PSO already has an open talk session. `pso` carries whichever
    /// identifier the raising layer holds (email in the service, id in the
    /// store).
    #[error("talk session already active for {pso}")]
    TalkSessionActive {
        pso: String,
        /// Display name of the supervisor currently holding the session,
        /// when it could be resolved.
        owner: Option<String>,
    },

    /// Malformed request input (empty key, bad email, missing reason).
    #[error("validation error: {0}")]
    Validation(String),

    /// Broadcast or group-send failure on the messaging channel.
    #[error("broadcast error: {message}")]
    Broadcast {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Media-egress server failure, normalized at the client boundary.
    #[error("egress error: {0}")]
    Egress(#[from] EgressError),

    /// Repository or management-service failure.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VigilError {
    /// Shorthand for a storage failure without an underlying source.
    pub fn storage(message: impl Into<String>) -> Self {
        VigilError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a broadcast failure without an underlying source.
    pub fn broadcast(message: impl Into<String>) -> Self {
        VigilError::Broadcast {
            message: message.into(),
            source: None,
        }
    }
}
