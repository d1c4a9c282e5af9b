// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all backend adapters implement.

use async_trait::async_trait;

use crate::error::LocalMindError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Local-Mind backend adapters.
///
/// Every adapter (session log, retrieval index, generation client) implements
/// this trait, which provides identity, lifecycle, and health check capabilities.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of backend this adapter fronts.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, LocalMindError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), LocalMindError>;
}
