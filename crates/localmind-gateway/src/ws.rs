// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat WebSocket at `/ws/chat/{session_id}`.
//!
//! Each inbound text frame is one user message. The reply is streamed back
//! as one text frame per token, with no envelope.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use localmind_core::{ChatTransport, LocalMindError};

use crate::server::GatewayState;

/// WebSocket upgrade handler.
pub async fn ws_chat(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let mut transport = WsTransport::new(socket);
        state
            .orchestrator
            .run_connection(&session_id, &mut transport)
            .await;
    })
}

/// [`ChatTransport`] over an axum WebSocket.
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl ChatTransport for WsTransport {
    async fn recv(&mut self) -> Option<String> {
        while let Some(msg) = self.socket.recv().await {
            match msg {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by tungstenite; binary is not part of the protocol.
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "websocket receive failed");
                    return None;
                }
            }
        }
        None
    }

    async fn send(&mut self, frame: String) -> Result<(), LocalMindError> {
        self.socket
            .send(Message::Text(frame.into()))
            .await
            .map_err(|_| LocalMindError::TransportClosed)
    }
}
