// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation backend for deterministic testing.
//!
//! `MockGeneration` implements `GenerationClient` and `ModelAdmin` with
//! scripted replies and text-derived embeddings, recording every call.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use localmind_agent::enricher::title_prompt;
use localmind_core::{
    AdapterType, ChatMessage, GenerationClient, HealthStatus, LocalMindError, ModelAdmin,
    ModelInfo, PluginAdapter, TokenStream,
};

/// One recorded `stream_chat` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub context: Option<String>,
}

/// A generation backend that replays scripted token sequences.
///
/// Chat replies are popped from a FIFO queue; when it is empty the reply is
/// `["mock", " response"]`. Title requests from the session enricher are
/// answered separately so they never consume the chat queue.
///
/// Embeddings are a deterministic bag-of-bytes projection of the text, so
/// identical texts embed identically.
pub struct MockGeneration {
    dimension: usize,
    replies: Mutex<VecDeque<Vec<String>>>,
    title: Mutex<String>,
    failing_embeds: Mutex<HashSet<String>>,
    fail_all_embeds: Mutex<bool>,
    chat_calls: Mutex<Vec<ChatCall>>,
    title_calls: Mutex<usize>,
    embed_calls: Mutex<Vec<String>>,
    models: Mutex<Vec<ModelInfo>>,
    pulled: Mutex<Vec<String>>,
}

impl MockGeneration {
    /// Create a mock producing embeddings of `dimension` floats.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            replies: Mutex::new(VecDeque::new()),
            title: Mutex::new("Mock Title".to_string()),
            failing_embeds: Mutex::new(HashSet::new()),
            fail_all_embeds: Mutex::new(false),
            chat_calls: Mutex::new(Vec::new()),
            title_calls: Mutex::new(0),
            embed_calls: Mutex::new(Vec::new()),
            models: Mutex::new(vec![model("llama3:latest")]),
            pulled: Mutex::new(Vec::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Queue a chat reply, given as its tokens.
    pub async fn push_reply<S: Into<String>>(&self, tokens: Vec<S>) {
        self.replies
            .lock()
            .await
            .push_back(tokens.into_iter().map(Into::into).collect());
    }

    /// Set the raw text returned for title requests.
    pub async fn set_title(&self, raw: impl Into<String>) {
        *self.title.lock().await = raw.into();
    }

    /// Make `embed` fail for exactly this text.
    pub async fn fail_embedding_for(&self, text: impl Into<String>) {
        self.failing_embeds.lock().await.insert(text.into());
    }

    /// Make every `embed` call fail.
    pub async fn fail_all_embeddings(&self) {
        *self.fail_all_embeds.lock().await = true;
    }

    /// Replace the installed model list.
    pub async fn set_models(&self, names: &[&str]) {
        *self.models.lock().await = names.iter().map(|n| model(n)).collect();
    }

    /// Chat calls made by the orchestrator, in order. Title requests are excluded.
    pub async fn chat_calls(&self) -> Vec<ChatCall> {
        self.chat_calls.lock().await.clone()
    }

    /// Number of title requests made by the enricher.
    pub async fn title_calls(&self) -> usize {
        *self.title_calls.lock().await
    }

    /// Texts passed to `embed`, in order.
    pub async fn embed_calls(&self) -> Vec<String> {
        self.embed_calls.lock().await.clone()
    }

    /// Models passed to `pull_model`, in order.
    pub async fn pulled(&self) -> Vec<String> {
        self.pulled.lock().await.clone()
    }

    /// The embedding this mock returns for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        text_vector(text, self.dimension)
    }
}

/// Deterministic embedding: each byte bumps one bucket chosen by value and position.
pub fn text_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut v = vec![0.0_f32; dimension.max(1)];
    for (i, b) in text.bytes().enumerate() {
        let bucket = (b as usize + i) % v.len();
        v[bucket] += 1.0;
    }
    v
}

fn model(name: &str) -> ModelInfo {
    ModelInfo {
        name: name.to_string(),
        size: 0,
        digest: String::new(),
        modified_at: String::new(),
    }
}

fn is_title_request(messages: &[ChatMessage], context: &Option<String>) -> bool {
    let marker = title_prompt("");
    context.is_none()
        && messages.len() == 1
        && messages[0].content.starts_with(&marker)
}

#[async_trait]
impl PluginAdapter for MockGeneration {
    fn name(&self) -> &str {
        "mock-generation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, LocalMindError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LocalMindError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationClient for MockGeneration {
    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, LocalMindError> {
        self.embed_calls.lock().await.push(text.to_string());
        if *self.fail_all_embeds.lock().await || self.failing_embeds.lock().await.contains(text) {
            return Err(LocalMindError::EmbeddingFailure {
                message: format!("mock embedding failure for `{text}`"),
                source: None,
            });
        }
        Ok(self.vector_for(text))
    }

    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        context: Option<String>,
    ) -> TokenStream {
        if is_title_request(&messages, &context) {
            *self.title_calls.lock().await += 1;
            let title = self.title.lock().await.clone();
            return Box::pin(stream::iter(vec![title]));
        }

        self.chat_calls.lock().await.push(ChatCall {
            model: model.to_string(),
            messages,
            context,
        });
        let tokens = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| vec!["mock".to_string(), " response".to_string()]);
        Box::pin(stream::iter(tokens))
    }
}

#[async_trait]
impl ModelAdmin for MockGeneration {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LocalMindError> {
        Ok(self.models.lock().await.clone())
    }

    async fn pull_model(&self, name: &str) -> Result<(), LocalMindError> {
        self.pulled.lock().await.push(name.to_string());
        self.models.lock().await.push(model(name));
        Ok(())
    }

    async fn delete_model(&self, name: &str) -> Result<bool, LocalMindError> {
        let mut models = self.models.lock().await;
        let before = models.len();
        models.retain(|m| m.name != name);
        Ok(models.len() != before)
    }
}
