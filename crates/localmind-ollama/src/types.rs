// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the Ollama HTTP API.

use localmind_core::{ChatMessage, ModelInfo};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
}

/// Response of `POST /api/embeddings`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// One newline-delimited line of a streamed `POST /api/chat` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    /// Set when the backend fails after the stream has started.
    #[serde(default)]
    pub error: Option<String>,
}

/// The partial assistant message carried by a [`ChatChunk`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

/// Response of `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Body of `POST /api/pull`.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

/// Body of `DELETE /api/delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub name: &'a str,
}
