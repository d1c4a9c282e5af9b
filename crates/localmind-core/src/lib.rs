// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Local-Mind.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Every backend adapter (session
//! log, retrieval index, generation client) implements traits defined here,
//! and the chat orchestrator depends only on those traits.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LocalMindError;
pub use types::{
    ActiveModel, AdapterType, ChatMessage, HealthStatus, ModelInfo, Role, SessionMeta,
    DEFAULT_SESSION_TITLE,
};

pub use traits::{
    ChatTransport, GenerationClient, ModelAdmin, PluginAdapter, RetrievalIndex, SessionLog,
    StorageAdapter, TokenStream,
};
