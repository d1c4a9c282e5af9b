// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding and streaming chat generation, plus model administration.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::LocalMindError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, ModelInfo};

/// A finite, non-restartable sequence of response tokens.
///
/// Backend failures never surface as stream errors: they arrive as one final
/// human-readable token.
pub type TokenStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Text generation backend.
///
/// Every call takes the model name explicitly; callers resolve it once from
/// the [`ActiveModel`](crate::types::ActiveModel) cell per unit of work.
#[async_trait]
pub trait GenerationClient: PluginAdapter {
    /// Embeds `text`, returning [`LocalMindError::EmbeddingFailure`] on any
    /// backend error, timeout, or empty/malformed result.
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, LocalMindError>;

    /// Streams a reply to `messages`, injecting `context` into the system
    /// preamble when it is non-empty.
    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        context: Option<String>,
    ) -> TokenStream;
}

/// Administrative operations on the models installed in the backend.
#[async_trait]
pub trait ModelAdmin: Send + Sync + 'static {
    /// Lists installed models.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LocalMindError>;

    /// Downloads a model. Callers run this detached; it can take minutes.
    async fn pull_model(&self, name: &str) -> Result<(), LocalMindError>;

    /// Deletes a model, returning whether the backend accepted the request.
    async fn delete_model(&self, name: &str) -> Result<bool, LocalMindError>;
}
