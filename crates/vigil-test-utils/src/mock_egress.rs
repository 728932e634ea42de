// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media-egress client for deterministic testing.
//!
//! `MockEgress` implements `EgressClient` with scripted results: queued
//! outcomes are consumed in order, and calls fall back to a generic success
//! when nothing is queued. All calls are captured for assertion.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::traits::egress::{
    EgressClient, EgressError, EgressHandle, EgressInfo, EgressStopResult,
};
use vigil_core::types::{EgressId, EgressStatus};

/// A scriptable egress client.
pub struct MockEgress {
    start_results: Mutex<VecDeque<Result<EgressHandle, EgressError>>>,
    stop_results: Mutex<VecDeque<Result<EgressStopResult, EgressError>>>,
    info: Mutex<HashMap<EgressId, EgressInfo>>,
    started: Mutex<Vec<(String, String)>>,
    stopped: Mutex<Vec<EgressId>>,
}

impl MockEgress {
    pub fn new() -> Self {
        Self {
            start_results: Mutex::new(VecDeque::new()),
            stop_results: Mutex::new(VecDeque::new()),
            info: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome of the next `start_egress` call.
    pub async fn push_start_result(&self, result: Result<EgressHandle, EgressError>) {
        self.start_results.lock().await.push_back(result);
    }

    /// Queue the outcome of the next `stop_egress` call.
    pub async fn push_stop_result(&self, result: Result<EgressStopResult, EgressError>) {
        self.stop_results.lock().await.push_back(result);
    }

    /// Set what `get_egress_info` reports for an egress id.
    pub async fn set_info(&self, info: EgressInfo) {
        self.info.lock().await.insert(info.egress_id.clone(), info);
    }

    /// `(room, label)` pairs passed to `start_egress`, in call order.
    pub async fn started_rooms(&self) -> Vec<(String, String)> {
        self.started.lock().await.clone()
    }

    /// Egress ids passed to `stop_egress`, in call order.
    pub async fn stopped_ids(&self) -> Vec<EgressId> {
        self.stopped.lock().await.clone()
    }
}

impl Default for MockEgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EgressClient for MockEgress {
    async fn start_egress(&self, room: &str, label: &str) -> Result<EgressHandle, EgressError> {
        self.started
            .lock()
            .await
            .push((room.to_string(), label.to_string()));
        if let Some(scripted) = self.start_results.lock().await.pop_front() {
            return scripted;
        }
        Ok(EgressHandle {
            egress_id: EgressId(format!("eg-{}", uuid::Uuid::new_v4())),
            object_key: format!("recordings/{room}.mp4"),
        })
    }

    async fn stop_egress(&self, egress_id: &EgressId) -> Result<EgressStopResult, EgressError> {
        self.stopped.lock().await.push(egress_id.clone());
        if let Some(scripted) = self.stop_results.lock().await.pop_front() {
            return scripted;
        }
        Ok(EgressStopResult {
            status: Some(EgressStatus::Complete),
            blob_url: None,
        })
    }

    async fn get_egress_info(
        &self,
        egress_id: &EgressId,
    ) -> Result<Option<EgressInfo>, EgressError> {
        Ok(self.info.lock().await.get(egress_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_results_are_consumed_in_order() {
        let egress = MockEgress::new();
        egress
            .push_start_result(Err(EgressError::Transport {
                message: "down".into(),
            }))
            .await;

        assert!(egress.start_egress("room-1", "label").await.is_err());
        // Queue drained; falls back to generic success.
        let handle = egress.start_egress("room-1", "label").await.unwrap();
        assert!(handle.object_key.contains("room-1"));
        assert_eq!(egress.started_rooms().await.len(), 2);
    }

    #[tokio::test]
    async fn info_defaults_to_unknown() {
        let egress = MockEgress::new();
        let id = EgressId("eg-missing".into());
        assert!(egress.get_egress_info(&id).await.unwrap().is_none());
    }
}
