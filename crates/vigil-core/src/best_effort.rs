// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Swallow-and-log wrapper for side-channel calls.
//!
//! Cleanup cascades and notification fan-outs must keep going when one step
//! fails. Wrapping each step in [`best_effort`] logs the failure with its
//! context and resolves to `None` instead of propagating, so no single side
//! channel can abort the primary flow.

use std::future::Future;

use tracing::warn;

use crate::error::VigilError;

/// Await `fut`; on failure log a warning tagged with `context` and return
/// `None`. Never propagates the error.
pub async fn best_effort<T, F>(context: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, VigilError>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(error = %error, "{context} failed");
            None
        }
    }
}
