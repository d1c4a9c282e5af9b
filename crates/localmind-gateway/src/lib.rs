// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for Local-Mind.
//!
//! Exposes the chat socket at `/ws/chat/{session_id}` plus REST routes for
//! sessions, the fact index, and model administration. Handlers only talk to
//! the adapter traits in `localmind-core` and the agent's orchestrator.

pub mod handlers;
pub mod knowledge;
pub mod models;
pub mod server;
pub mod ws;

pub use server::{build_router, serve, start_server, GatewayState};
pub use ws::WsTransport;
