// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording-session state machine against the media-egress server.
//!
//! Sessions move `Active -> {Completed | Failed}` and never reopen; a new
//! start always creates a new row. Stop classification:
//! - clean stop -> Completed, with the final blob URL
//! - egress already failed -> Failed
//! - egress unknown/not active -> Completed (the remote job vanished;
//!   treated as completion via disconnection)
//! - anything else -> Failed
//!
//! Start failures re-throw to the caller; stop failures fold into a
//! structured [`StopOutcome`] instead of propagating.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use vigil_config::RecordingConfig;
use vigil_core::model::{NewRecordingSession, RecordingSession, User};
use vigil_core::traits::egress::EgressError;
use vigil_core::traits::{BlobStore, EgressClient, RecordingSessionRepository};
use vigil_core::types::{RecordingSessionId, RecordingStatus, UserId};
use vigil_core::{best_effort, VigilError};

use crate::watch::EgressWatch;

/// Structured result of stopping one session.
#[derive(Debug, Clone, PartialEq)]
pub struct StopOutcome {
    pub session_id: RecordingSessionId,
    pub status: RecordingStatus,
    /// Time-limited signed playback URL, when a blob path exists and the
    /// stop completed.
    pub playback_url: Option<String>,
    pub message: String,
}

/// Aggregate result of stopping all of a user's active sessions.
#[derive(Debug, Clone)]
pub struct StopAllSummary {
    pub total: usize,
    pub completed: usize,
    pub results: Vec<StopOutcome>,
    pub message: String,
}

/// Result of deleting a recording, distinguishing partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub blob_deleted: bool,
    /// The blob was absent or could not be deleted; never fatal.
    pub blob_missing: bool,
    pub db_deleted: bool,
}

/// Owns the recording-session lifecycle.
pub struct RecordingOrchestrator {
    egress: Arc<dyn EgressClient>,
    sessions: Arc<dyn RecordingSessionRepository>,
    blobs: Arc<dyn BlobStore>,
    config: RecordingConfig,
    watch: Arc<EgressWatch>,
}

impl RecordingOrchestrator {
    pub fn new(
        egress: Arc<dyn EgressClient>,
        sessions: Arc<dyn RecordingSessionRepository>,
        blobs: Arc<dyn BlobStore>,
        config: RecordingConfig,
    ) -> Self {
        Self {
            egress,
            sessions,
            blobs,
            config,
            watch: Arc::new(EgressWatch::new()),
        }
    }

    /// Begin recording a room and persist the Active session. Schedules a
    /// deferred re-query of the egress server; if it reports failure, the
    /// session is marked Failed. Start failures are not swallowed.
    pub async fn start(
        &self,
        room: &str,
        initiated_by: &UserId,
        subject_id: Option<&UserId>,
        subject_label: &str,
    ) -> Result<RecordingSession, VigilError> {
        let handle = self
            .egress
            .start_egress(room, subject_label)
            .await
            .map_err(|error| {
                error!(room, error = %error, "egress start failed");
                VigilError::from(error)
            })?;

        let session = self
            .sessions
            .create_active(NewRecordingSession {
                room: room.to_string(),
                egress_id: handle.egress_id.clone(),
                initiated_by: initiated_by.clone(),
                subject_id: subject_id.cloned(),
                subject_label: subject_label.to_string(),
                started_at: Utc::now(),
                blob_path: Some(handle.object_key),
            })
            .await
            .map_err(|error| {
                // No row was created, so there is nothing to mark Failed.
                error!(
                    room,
                    egress = %handle.egress_id,
                    error = %error,
                    "failed to persist recording session after egress start"
                );
                error
            })?;

        info!(session = %session.id, egress = %session.egress_id, room, "recording started");
        self.spawn_deferred_check(&session).await;
        Ok(session)
    }

    /// A user's active sessions: the union of sessions recording their room
    /// and sessions where they are the recorded subject, deduplicated by id.
    pub async fn find_active_for_user(
        &self,
        user: &User,
    ) -> Result<Vec<RecordingSession>, VigilError> {
        let mut sessions = self.sessions.find_active_by_room(&user.email).await?;
        sessions.extend(self.sessions.find_active_by_subject(&user.id).await?);

        let mut seen = HashSet::new();
        sessions.retain(|s| seen.insert(s.id.clone()));
        Ok(sessions)
    }

    /// Stop a session by id. NotFound when the row does not exist.
    pub async fn stop_by_id(
        &self,
        id: &RecordingSessionId,
    ) -> Result<StopOutcome, VigilError> {
        let session = self
            .sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| VigilError::RecordingNotFound { id: id.clone() })?;
        Ok(self.stop_session(&session).await)
    }

    /// Stop one session, folding every failure mode into the outcome.
    pub async fn stop_session(&self, session: &RecordingSession) -> StopOutcome {
        // Snapshot egress state for log context; a lookup failure is only
        // a lost log line.
        match self.egress.get_egress_info(&session.egress_id).await {
            Ok(Some(info)) => {
                debug!(
                    session = %session.id,
                    egress = %session.egress_id,
                    status = %info.status,
                    "stopping recording"
                );
            }
            Ok(None) => {}
            Err(error) => {
                warn!(session = %session.id, error = %error, "egress info lookup failed");
            }
        }

        match self.egress.stop_egress(&session.egress_id).await {
            Ok(result) => {
                let blob_url = result.blob_url.or_else(|| {
                    session
                        .blob_path
                        .as_deref()
                        .map(|p| self.blobs.build_https_url(p))
                });
                self.finish_completed(session, blob_url, "recording stopped".to_string())
                    .await
            }
            Err(EgressError::AlreadyFailed {
                status,
                detail,
                message,
            }) => {
                error!(
                    session = %session.id,
                    egress = %session.egress_id,
                    status = ?status,
                    detail = ?detail,
                    "egress ended in failure before stop"
                );
                self.finish_failed(session, format!("egress already failed: {message}"))
                    .await
            }
            Err(EgressError::NotActive { message }) => {
                // The remote job vanished; treat as graceful completion
                // with the best-known blob URL.
                debug!(
                    session = %session.id,
                    egress = %session.egress_id,
                    "no active egress at stop; completing as disconnected"
                );
                let blob_url = session.blob_url.clone().or_else(|| {
                    session
                        .blob_path
                        .as_deref()
                        .map(|p| self.blobs.build_https_url(p))
                });
                self.finish_completed(
                    session,
                    blob_url,
                    format!("completed after egress disconnect: {message}"),
                )
                .await
            }
            Err(error) => {
                error!(
                    session = %session.id,
                    egress = %session.egress_id,
                    error = %error,
                    "recording stop failed"
                );
                self.finish_failed(session, format!("stop failed: {error}"))
                    .await
            }
        }
    }

    /// Stop every active session for a user. Sessions are independent: one
    /// failure never blocks the rest. Idempotent once all sessions are
    /// terminal.
    pub async fn stop_all_for_user(&self, user: &User) -> Result<StopAllSummary, VigilError> {
        let sessions = self.find_active_for_user(user).await?;
        let total = sessions.len();

        let mut results = Vec::with_capacity(total);
        for session in &sessions {
            results.push(self.stop_session(session).await);
        }

        let completed = results
            .iter()
            .filter(|r| r.status == RecordingStatus::Completed)
            .count();
        Ok(StopAllSummary {
            total,
            completed,
            results,
            message: format!("stopped {completed} of {total} active recording sessions"),
        })
    }

    /// Delete a recording: blob first (tolerating absence), then the row
    /// unconditionally.
    pub async fn delete(&self, id: &RecordingSessionId) -> Result<DeleteOutcome, VigilError> {
        let session = self
            .sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| VigilError::RecordingNotFound { id: id.clone() })?;
        self.watch.cancel(&session.egress_id).await;

        let path = session
            .blob_path
            .clone()
            .or_else(|| session.blob_url.as_deref().and_then(blob_path_from_url));

        let (blob_deleted, blob_missing) = match path.as_deref() {
            Some(path) => match self.blobs.delete_recording(path).await {
                Ok(true) => (true, false),
                Ok(false) => {
                    debug!(session = %id, path, "recording blob was already gone");
                    (false, true)
                }
                Err(error) => {
                    warn!(session = %id, path, error = %error, "recording blob deletion failed");
                    (false, true)
                }
            },
            None => (false, true),
        };

        let db_deleted = self.sessions.delete_by_id(id).await?;
        Ok(DeleteOutcome {
            blob_deleted,
            blob_missing,
            db_deleted,
        })
    }

    /// Persist completion; on a repository error fall back to Failed so the
    /// row never stays Active after a stop attempt.
    async fn finish_completed(
        &self,
        session: &RecordingSession,
        blob_url: Option<String>,
        message: String,
    ) -> StopOutcome {
        match self.sessions.complete(&session.id, Utc::now(), blob_url).await {
            Ok(()) => {
                self.watch.cancel(&session.egress_id).await;
                let playback_url = match &session.blob_path {
                    Some(path) => {
                        let minutes = self.config.sas_url_minutes.max(1);
                        best_effort(
                            "signed playback url",
                            self.blobs.read_sas_url(path, minutes),
                        )
                        .await
                    }
                    None => None,
                };
                StopOutcome {
                    session_id: session.id.clone(),
                    status: RecordingStatus::Completed,
                    playback_url,
                    message,
                }
            }
            Err(error) => {
                error!(
                    session = %session.id,
                    error = %error,
                    "failed to persist recording completion"
                );
                self.finish_failed(session, format!("completion could not be persisted: {error}"))
                    .await
            }
        }
    }

    /// Persist failure best-effort and cancel the deferred check.
    async fn finish_failed(&self, session: &RecordingSession, message: String) -> StopOutcome {
        self.watch.cancel(&session.egress_id).await;
        if let Err(error) = self.sessions.fail(&session.id, Utc::now()).await {
            error!(
                session = %session.id,
                error = %error,
                "failed to persist recording failure"
            );
        }
        StopOutcome {
            session_id: session.id.clone(),
            status: RecordingStatus::Failed,
            playback_url: None,
            message,
        }
    }

    /// One-shot re-query of the egress server after a start. Cancelled by
    /// any terminal transition through the normal stop path.
    async fn spawn_deferred_check(&self, session: &RecordingSession) {
        let token = self.watch.register(&session.egress_id).await;
        let egress = Arc::clone(&self.egress);
        let sessions = Arc::clone(&self.sessions);
        let watch = Arc::clone(&self.watch);
        let delay = Duration::from_millis(self.config.egress_check_delay_ms);
        let session = session.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            match egress.get_egress_info(&session.egress_id).await {
                Ok(Some(info)) if info.status.is_failure() => {
                    if let Err(error) = sessions.fail(&session.id, Utc::now()).await {
                        error!(
                            session = %session.id,
                            error = %error,
                            "failed to persist deferred egress failure"
                        );
                    }
                    error!(
                        session = %session.id,
                        egress = %session.egress_id,
                        room = %session.room,
                        initiator = %session.initiated_by,
                        subject = ?session.subject_id,
                        status = %info.status,
                        detail = ?info.detail,
                        egress_error = ?info.error,
                        "egress reported failure shortly after start"
                    );
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        session = %session.id,
                        egress = %session.egress_id,
                        error = %error,
                        "deferred egress check failed"
                    );
                }
            }
            watch.forget(&session.egress_id).await;
        });
    }
}

/// Recover a blob path from a stored HTTPS URL: everything after the host,
/// with any query string dropped.
fn blob_path_from_url(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, rest)| rest)?;
    let (_, path) = rest.split_once('/')?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
