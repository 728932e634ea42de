// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable deferred-check registry, keyed by egress id.
//!
//! Starting a recording schedules a one-shot re-query of the egress server.
//! A session that reaches a terminal state through the normal stop path
//! cancels its pending check, so a clean stop never produces a spurious
//! failure transition.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use vigil_core::types::EgressId;

/// Tracks one [`CancellationToken`] per in-flight deferred check.
pub struct EgressWatch {
    tokens: Mutex<HashMap<EgressId, CancellationToken>>,
}

impl EgressWatch {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Register a pending check and return its token. Registering the same
    /// egress id again cancels the previous check first.
    pub async fn register(&self, egress_id: &EgressId) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(stale) = self
            .tokens
            .lock()
            .await
            .insert(egress_id.clone(), token.clone())
        {
            stale.cancel();
        }
        token
    }

    /// Cancel and forget the pending check for an egress id. No-op when
    /// none is registered.
    pub async fn cancel(&self, egress_id: &EgressId) {
        if let Some(token) = self.tokens.lock().await.remove(egress_id) {
            token.cancel();
        }
    }

    /// Forget a check that has already run to completion.
    pub async fn forget(&self, egress_id: &EgressId) {
        self.tokens.lock().await.remove(egress_id);
    }

    /// Number of checks currently registered.
    pub async fn pending(&self) -> usize {
        self.tokens.lock().await.len()
    }
}

impl Default for EgressWatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_fires_the_registered_token() {
        let watch = EgressWatch::new();
        let id = EgressId("eg-1".into());
        let token = watch.register(&id).await;
        assert!(!token.is_cancelled());

        watch.cancel(&id).await;
        assert!(token.is_cancelled());
        assert_eq!(watch.pending().await, 0);
    }

    #[tokio::test]
    async fn re_registering_cancels_the_stale_token() {
        let watch = EgressWatch::new();
        let id = EgressId("eg-1".into());
        let first = watch.register(&id).await;
        let second = watch.register(&id).await;

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(watch.pending().await, 1);
    }

    #[tokio::test]
    async fn cancel_unknown_id_is_noop() {
        let watch = EgressWatch::new();
        watch.cancel(&EgressId("eg-ghost".into())).await;
        assert_eq!(watch.pending().await, 0);
    }
}
