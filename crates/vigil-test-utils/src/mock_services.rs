// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock streaming, blob, and user-management collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::model::User;
use vigil_core::traits::{BlobStore, StreamingSessions, UserManagement};
use vigil_core::types::{StreamStopReason, UserId};
use vigil_core::VigilError;

/// Records streaming start/stop calls.
pub struct MockStreaming {
    started: Mutex<Vec<UserId>>,
    stopped: Mutex<Vec<(UserId, StreamStopReason)>>,
    fail_all: AtomicBool,
}

impl MockStreaming {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            fail_all: AtomicBool::new(false),
        }
    }

    pub async fn started_users(&self) -> Vec<UserId> {
        self.started.lock().await.clone()
    }

    pub async fn stopped_users(&self) -> Vec<(UserId, StreamStopReason)> {
        self.stopped.lock().await.clone()
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }
}

impl Default for MockStreaming {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamingSessions for MockStreaming {
    async fn start(&self, user_id: &UserId) -> Result<(), VigilError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(VigilError::Internal("streaming manager down".into()));
        }
        self.started.lock().await.push(user_id.clone());
        Ok(())
    }

    async fn stop(&self, user_id: &UserId, reason: StreamStopReason) -> Result<(), VigilError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(VigilError::Internal("streaming manager down".into()));
        }
        self.stopped.lock().await.push((user_id.clone(), reason));
        Ok(())
    }
}

/// Blob store backed by a set of known paths.
pub struct MockBlobStore {
    existing: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    fail_delete: AtomicBool,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            existing: Mutex::new(HashSet::new()),
            deleted: Mutex::new(Vec::new()),
            fail_delete: AtomicBool::new(false),
        }
    }

    /// Register a blob path as existing.
    pub async fn put(&self, path: &str) {
        self.existing.lock().await.insert(path.to_string());
    }

    pub async fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    /// Make the next delete call error instead of reporting not-found.
    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn delete_recording(&self, path: &str) -> Result<bool, VigilError> {
        if self.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(VigilError::Internal("blob container unreachable".into()));
        }
        let removed = self.existing.lock().await.remove(path);
        if removed {
            self.deleted.lock().await.push(path.to_string());
        }
        Ok(removed)
    }

    fn build_https_url(&self, path: &str) -> String {
        format!("https://blobs.test/{path}")
    }

    async fn read_sas_url(&self, path: &str, minutes: u32) -> Result<String, VigilError> {
        let minutes = minutes.max(1);
        Ok(format!("https://blobs.test/{path}?sas={minutes}m"))
    }
}

/// User-management mock: eligibility and bulk reassignment.
pub struct MockManagement {
    ineligible: Mutex<HashSet<UserId>>,
    reassignments: Mutex<Vec<(Vec<String>, Option<UserId>)>>,
    fail_reassign: AtomicBool,
}

impl MockManagement {
    pub fn new() -> Self {
        Self {
            ineligible: Mutex::new(HashSet::new()),
            reassignments: Mutex::new(Vec::new()),
            fail_reassign: AtomicBool::new(false),
        }
    }

    /// Mark a user as not eligible for supervisor changes.
    pub async fn mark_ineligible(&self, user_id: &UserId) {
        self.ineligible.lock().await.insert(user_id.clone());
    }

    pub async fn reassignments(&self) -> Vec<(Vec<String>, Option<UserId>)> {
        self.reassignments.lock().await.clone()
    }

    pub fn fail_reassign(&self) {
        self.fail_reassign.store(true, Ordering::SeqCst);
    }
}

impl Default for MockManagement {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserManagement for MockManagement {
    async fn can_change_supervisor(&self, user: &User) -> Result<bool, VigilError> {
        Ok(!self.ineligible.lock().await.contains(&user.id))
    }

    async fn reassign_supervisor(
        &self,
        emails: &[String],
        new_supervisor: Option<UserId>,
    ) -> Result<u64, VigilError> {
        if self.fail_reassign.load(Ordering::SeqCst) {
            return Err(VigilError::storage("bulk update failed"));
        }
        self.reassignments
            .lock()
            .await
            .push((emails.to_vec(), new_supervisor));
        Ok(emails.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_delete_reports_missing_paths() {
        let blobs = MockBlobStore::new();
        blobs.put("recordings/a.mp4").await;

        assert!(blobs.delete_recording("recordings/a.mp4").await.unwrap());
        assert!(!blobs.delete_recording("recordings/a.mp4").await.unwrap());
        assert_eq!(blobs.deleted_paths().await, vec!["recordings/a.mp4"]);
    }

    #[tokio::test]
    async fn sas_url_clamps_to_one_minute() {
        let blobs = MockBlobStore::new();
        let url = blobs.read_sas_url("recordings/a.mp4", 0).await.unwrap();
        assert!(url.ends_with("sas=1m"));
    }
}
