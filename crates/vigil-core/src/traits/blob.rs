// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob storage for finished recordings.

use async_trait::async_trait;

use crate::error::VigilError;

/// Recording blob operations and URL construction.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Delete a recording blob. Returns false when the blob was not found.
    async fn delete_recording(&self, path: &str) -> Result<bool, VigilError>;

    /// Permanent HTTPS URL for a blob path.
    fn build_https_url(&self, path: &str) -> String;

    /// Time-limited signed read URL. Implementations clamp `minutes` to at
    /// least one minute.
    async fn read_sas_url(&self, path: &str, minutes: u32) -> Result<String, VigilError>;
}
