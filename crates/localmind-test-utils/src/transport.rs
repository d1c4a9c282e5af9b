// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted chat transport for driving the orchestrator without a socket.

use std::collections::VecDeque;

use async_trait::async_trait;
use localmind_core::{ChatTransport, LocalMindError};

/// Replays queued inbound frames and captures everything sent back.
///
/// `recv` returns `None` once the queue is empty, which the orchestrator
/// treats as the client hanging up.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    close_after: Option<usize>,
}

impl ScriptedTransport {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbound: frames.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Simulate the client disconnecting after `sends` frames were delivered.
    pub fn close_after(mut self, sends: usize) -> Self {
        self.close_after = Some(sends);
        self
    }

    /// Frames delivered to the client, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// All delivered frames concatenated.
    pub fn sent_text(&self) -> String {
        self.sent.concat()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn recv(&mut self) -> Option<String> {
        self.inbound.pop_front()
    }

    async fn send(&mut self, frame: String) -> Result<(), LocalMindError> {
        if self.close_after.is_some_and(|limit| self.sent.len() >= limit) {
            return Err(LocalMindError::TransportClosed);
        }
        self.sent.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_frames_then_hangs_up() {
        let mut t = ScriptedTransport::new(["a", "b"]);
        assert_eq!(t.recv().await.as_deref(), Some("a"));
        assert_eq!(t.recv().await.as_deref(), Some("b"));
        assert_eq!(t.recv().await, None);
    }

    #[tokio::test]
    async fn close_after_rejects_further_sends() {
        let mut t = ScriptedTransport::default().close_after(1);
        t.send("one".into()).await.unwrap();
        let err = t.send("two".into()).await.unwrap_err();
        assert!(err.is_transport_closed());
        assert_eq!(t.sent(), ["one"]);
    }
}
