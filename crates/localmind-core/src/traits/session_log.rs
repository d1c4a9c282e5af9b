// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session ordered message log with metadata and idle expiry.

use async_trait::async_trait;

use crate::error::LocalMindError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, SessionMeta};

/// Append-only ordered store of messages per session.
///
/// Every write resets the session's idle-expiry timer. Expired sessions are
/// indistinguishable from sessions that never existed.
#[async_trait]
pub trait SessionLog: PluginAdapter {
    /// Appends a message, creating the session implicitly if it does not exist.
    async fn append(&self, session_id: &str, message: ChatMessage) -> Result<(), LocalMindError>;

    /// Returns the session's messages in insertion order.
    ///
    /// Backend failures yield an empty history rather than an error.
    async fn history(&self, session_id: &str) -> Vec<ChatMessage>;

    /// Creates a session with a fresh identifier and the current time.
    async fn create_session(&self, title: &str) -> Result<SessionMeta, LocalMindError>;

    /// Looks up a single session's metadata.
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionMeta>, LocalMindError>;

    /// Lists all live sessions, newest first.
    async fn list_sessions(&self) -> Result<Vec<SessionMeta>, LocalMindError>;

    /// Overwrites the title. No-op when the session does not exist.
    async fn update_title(&self, session_id: &str, title: &str) -> Result<(), LocalMindError>;

    /// Removes both the message log and the metadata. Idempotent.
    async fn delete_session(&self, session_id: &str) -> Result<(), LocalMindError>;
}
