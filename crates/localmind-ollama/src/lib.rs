// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama generation adapter for Local-Mind.
//!
//! This crate implements [`GenerationClient`] and [`ModelAdmin`] for a local
//! Ollama server: embeddings, streaming chat over newline-delimited JSON, and
//! model list/pull/delete.

pub mod client;
pub mod stream;
pub mod types;

use async_trait::async_trait;
use localmind_config::model::OllamaConfig;
use localmind_core::{
    AdapterType, ChatMessage, GenerationClient, HealthStatus, LocalMindError, ModelAdmin,
    ModelInfo, PluginAdapter, TokenStream,
};
use tracing::{info, warn};

use crate::client::{ChatOpenError, OllamaClient};
use crate::types::ChatRequest;

/// Fixed system preamble.
pub const SYSTEM_PROMPT: &str = "You are Local-Mind, a helpful AI assistant.";

/// Build the system preamble, appending retrieved context when there is any.
pub fn build_system_prompt(context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => {
            format!("{SYSTEM_PROMPT}\nRelevant Context from Memory:\n{ctx}")
        }
        _ => SYSTEM_PROMPT.to_string(),
    }
}

/// Prepend the system preamble to a conversation.
pub fn build_chat_messages(messages: Vec<ChatMessage>, context: Option<&str>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(ChatMessage::system(build_system_prompt(context)));
    out.extend(messages);
    out
}

/// Ollama provider implementing [`GenerationClient`] and [`ModelAdmin`].
pub struct OllamaGeneration {
    client: OllamaClient,
}

impl OllamaGeneration {
    /// Creates a new adapter from the `[ollama]` config section.
    pub fn new(config: &OllamaConfig) -> Result<Self, LocalMindError> {
        let client = OllamaClient::new(config)?;
        info!(base_url = %client.base_url(), "Ollama adapter initialized");
        Ok(Self { client })
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &OllamaClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for OllamaGeneration {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, LocalMindError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), LocalMindError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationClient for OllamaGeneration {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, LocalMindError> {
        self.client.embed(model, text).await
    }

    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        context: Option<String>,
    ) -> TokenStream {
        let request = ChatRequest {
            model: model.to_string(),
            messages: build_chat_messages(messages, context.as_deref()),
            stream: true,
        };

        match self.client.open_chat(&request).await {
            Ok(response) => stream::parse_ndjson_stream(response),
            Err(ChatOpenError::Unreachable(detail)) => {
                warn!(model, error = %detail, "generation backend unreachable");
                stream::single_token(stream::unavailable_token(&detail))
            }
            Err(ChatOpenError::ModelNotFound) => {
                warn!(model, "generation model not found");
                stream::single_token(stream::model_not_found_token(model))
            }
            Err(ChatOpenError::Status { status, body }) => {
                warn!(model, status = %status, "generation backend returned an error");
                stream::single_token(stream::status_token(status, &body))
            }
        }
    }
}

#[async_trait]
impl ModelAdmin for OllamaGeneration {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LocalMindError> {
        self.client.list_models().await
    }

    async fn pull_model(&self, name: &str) -> Result<(), LocalMindError> {
        info!(model = name, "pulling model");
        self.client.pull_model(name).await?;
        info!(model = name, "model pull complete");
        Ok(())
    }

    async fn delete_model(&self, name: &str) -> Result<bool, LocalMindError> {
        self.client.delete_model(name).await
    }
}
