// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle trait for persistence backends.

use async_trait::async_trait;

use crate::error::LocalMindError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for storage backends that must be opened before use.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), LocalMindError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), LocalMindError>;
}
