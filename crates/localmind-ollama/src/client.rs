// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama API.
//!
//! Provides [`OllamaClient`] which handles request construction, the
//! embedding timeout, opening chat streams, and transient error retry.

use std::time::Duration;

use localmind_config::model::OllamaConfig;
use localmind_core::{LocalMindError, ModelInfo};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::types::{
    ChatRequest, DeleteRequest, EmbeddingRequest, EmbeddingResponse, PullRequest, TagsResponse,
};

/// Why a chat stream could not be opened.
#[derive(Debug)]
pub enum ChatOpenError {
    /// The backend could not be reached at all.
    Unreachable(String),
    /// The backend answered 404 for the requested model.
    ModelNotFound,
    /// Any other non-success status, after retries.
    Status { status: StatusCode, body: String },
}

/// HTTP client for Ollama communication.
///
/// Every request has a connect timeout. Embedding requests also have an
/// overall timeout; chat streams do not, since inference may run long.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    embed_timeout: Duration,
    max_retries: u32,
}

impl OllamaClient {
    /// Creates a new client from the `[ollama]` config section.
    pub fn new(config: &OllamaConfig) -> Result<Self, LocalMindError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| LocalMindError::GenerationUnavailable {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embed_timeout: Duration::from_secs(config.embed_timeout_secs),
            max_retries: config.max_retries,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Requests an embedding for `text`.
    ///
    /// Any failure, including an empty vector, is an [`LocalMindError::EmbeddingFailure`].
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, LocalMindError> {
        let response = self
            .client
            .post(self.url("/api/embeddings"))
            .timeout(self.embed_timeout)
            .json(&EmbeddingRequest {
                model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| embedding_err(format!("embedding request failed: {e}"), Some(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(embedding_err(
                format!("embedding endpoint returned {status}: {body}"),
                None,
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| embedding_err(format!("malformed embedding response: {e}"), Some(e)))?;

        if parsed.embedding.is_empty() {
            return Err(embedding_err("embedding endpoint returned an empty vector".into(), None));
        }
        debug!(model, dimension = parsed.embedding.len(), "embedding received");
        Ok(parsed.embedding)
    }

    /// Opens a streaming chat request and returns the raw response.
    ///
    /// On transient errors (429, 500, 503), retries after a 1-second delay,
    /// up to the configured retry count.
    pub async fn open_chat(&self, request: &ChatRequest) -> Result<reqwest::Response, ChatOpenError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, "retrying chat request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.url("/api/chat"))
                .json(request)
                .send()
                .await
                .map_err(|e| ChatOpenError::Unreachable(e.to_string()))?;

            let status = response.status();
            debug!(status = %status, attempt, model = %request.model, "chat response received");

            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(ChatOpenError::ModelNotFound);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                attempt += 1;
                continue;
            }
            return Err(ChatOpenError::Status { status, body });
        }
    }

    /// Lists installed models via `GET /api/tags`.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LocalMindError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| unavailable(format!("model list request failed: {e}"), Some(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("model list returned {status}: {body}"), None));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed model list: {e}"), Some(e)))?;
        Ok(tags.models)
    }

    /// Downloads a model via `POST /api/pull`, waiting for completion.
    pub async fn pull_model(&self, name: &str) -> Result<(), LocalMindError> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&PullRequest { name, stream: false })
            .send()
            .await
            .map_err(|e| unavailable(format!("pull request failed: {e}"), Some(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("pull of `{name}` returned {status}: {body}"), None));
        }
        Ok(())
    }

    /// Deletes a model via `DELETE /api/delete`. Returns whether the backend accepted it.
    pub async fn delete_model(&self, name: &str) -> Result<bool, LocalMindError> {
        let response = self
            .client
            .delete(self.url("/api/delete"))
            .json(&DeleteRequest { name })
            .send()
            .await
            .map_err(|e| unavailable(format!("delete request failed: {e}"), Some(e)))?;

        let status = response.status();
        debug!(status = %status, model = name, "delete response received");
        Ok(status.is_success())
    }

    /// Cheap reachability probe.
    pub async fn ping(&self) -> Result<(), LocalMindError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.embed_timeout)
            .send()
            .await
            .map_err(|e| unavailable(format!("ollama unreachable: {e}"), Some(e)))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unavailable(format!("ollama returned {}", response.status()), None))
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

fn embedding_err(message: String, source: Option<reqwest::Error>) -> LocalMindError {
    LocalMindError::EmbeddingFailure {
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

fn unavailable(message: String, source: Option<reqwest::Error>) -> LocalMindError {
    LocalMindError::GenerationUnavailable {
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}
