// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across all Local-Mind crates.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Short label used in health responses.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Identifies the kind of backend an adapter fronts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    SessionLog,
    Retrieval,
    Generation,
}

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in a session log. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Session metadata: identifier, display title, and creation time in epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub title: String,
    pub created_at: i64,
}

/// Title given to sessions created implicitly by their first message.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// A generation model installed in the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: String,
}

/// Process-wide cell holding the name of the generation model in use.
///
/// Readers take a snapshot once per unit of work (a chat turn, an enrichment
/// run) and pass it down, so a concurrent [`ActiveModel::set`] never switches
/// models halfway through a turn.
#[derive(Debug)]
pub struct ActiveModel {
    current: ArcSwap<String>,
}

impl ActiveModel {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial.into()),
        }
    }

    /// Snapshot of the current model name.
    pub fn get(&self) -> Arc<String> {
        self.current.load_full()
    }

    /// Atomically replace the active model.
    pub fn set(&self, name: impl Into<String>) {
        self.current.store(Arc::new(name.into()));
    }
}
