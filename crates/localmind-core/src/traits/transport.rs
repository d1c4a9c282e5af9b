// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional text channel between a chat client and the orchestrator.

use async_trait::async_trait;

use crate::error::LocalMindError;

/// One client connection, keyed externally by session id.
#[async_trait]
pub trait ChatTransport: Send {
    /// Waits for the next inbound text frame. `None` once the client is gone.
    async fn recv(&mut self) -> Option<String>;

    /// Sends one outbound text frame, failing with
    /// [`LocalMindError::TransportClosed`] if the client disconnected.
    async fn send(&mut self, frame: String) -> Result<(), LocalMindError>;
}
