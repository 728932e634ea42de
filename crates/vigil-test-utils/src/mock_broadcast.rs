// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing broadcaster with per-method failure injection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use vigil_core::events::{PresenceUpdate, SupervisorChangeBroadcast};
use vigil_core::traits::Broadcaster;
use vigil_core::VigilError;

/// Everything sent through the mock hub, in send order.
#[derive(Debug, Clone)]
pub enum SentEvent {
    Group { group: String, payload: Value },
    Presence(PresenceUpdate),
    Message { channel: String, payload: Value },
    SupervisorChange(SupervisorChangeBroadcast),
}

/// A broadcaster that records every send and can be told to fail.
pub struct CapturingBroadcaster {
    events: Mutex<Vec<SentEvent>>,
    sync_calls: AtomicUsize,
    fail_presence: AtomicBool,
    fail_sync: AtomicBool,
    fail_messages: AtomicBool,
    fail_supervisor_change: AtomicBool,
    /// Group names whose sends fail.
    failing_groups: Mutex<HashSet<String>>,
}

impl CapturingBroadcaster {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            sync_calls: AtomicUsize::new(0),
            fail_presence: AtomicBool::new(false),
            fail_sync: AtomicBool::new(false),
            fail_messages: AtomicBool::new(false),
            fail_supervisor_change: AtomicBool::new(false),
            failing_groups: Mutex::new(HashSet::new()),
        }
    }

    pub async fn events(&self) -> Vec<SentEvent> {
        self.events.lock().await.clone()
    }

    /// Group payloads sent to a specific group name.
    pub async fn group_payloads(&self, group: &str) -> Vec<Value> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SentEvent::Group { group: g, payload } if g == group => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Channel payloads sent via `broadcast_message` to a specific channel.
    pub async fn channel_payloads(&self, channel: &str) -> Vec<Value> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SentEvent::Message {
                    channel: c,
                    payload,
                } if c == channel => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn presence_updates(&self) -> Vec<PresenceUpdate> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SentEvent::Presence(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn supervisor_changes(&self) -> Vec<SupervisorChangeBroadcast> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SentEvent::SupervisorChange(change) => Some(change.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sync_call_count(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn fail_presence(&self) {
        self.fail_presence.store(true, Ordering::SeqCst);
    }

    pub fn fail_sync(&self) {
        self.fail_sync.store(true, Ordering::SeqCst);
    }

    pub fn fail_messages(&self) {
        self.fail_messages.store(true, Ordering::SeqCst);
    }

    pub fn fail_supervisor_change(&self) {
        self.fail_supervisor_change.store(true, Ordering::SeqCst);
    }

    /// Make every send to `group` fail.
    pub async fn fail_group(&self, group: &str) {
        self.failing_groups.lock().await.insert(group.to_string());
    }
}

impl Default for CapturingBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for CapturingBroadcaster {
    async fn send_to_group(&self, group: &str, payload: Value) -> Result<(), VigilError> {
        if self.failing_groups.lock().await.contains(group) {
            return Err(VigilError::broadcast(format!("group {group} unreachable")));
        }
        self.events.lock().await.push(SentEvent::Group {
            group: group.to_string(),
            payload,
        });
        Ok(())
    }

    async fn broadcast_presence(&self, update: PresenceUpdate) -> Result<(), VigilError> {
        if self.fail_presence.load(Ordering::SeqCst) {
            return Err(VigilError::broadcast("presence hub unreachable"));
        }
        self.events.lock().await.push(SentEvent::Presence(update));
        Ok(())
    }

    async fn broadcast_message(&self, channel: &str, payload: Value) -> Result<(), VigilError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(VigilError::broadcast("message hub unreachable"));
        }
        self.events.lock().await.push(SentEvent::Message {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }

    async fn broadcast_supervisor_change(
        &self,
        change: SupervisorChangeBroadcast,
    ) -> Result<(), VigilError> {
        if self.fail_supervisor_change.load(Ordering::SeqCst) {
            return Err(VigilError::broadcast("supervisor hub unreachable"));
        }
        self.events
            .lock()
            .await
            .push(SentEvent::SupervisorChange(change));
        Ok(())
    }

    async fn sync_all_users(&self) -> Result<(), VigilError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(VigilError::broadcast("reconciliation failed"));
        }
        Ok(())
    }
}
