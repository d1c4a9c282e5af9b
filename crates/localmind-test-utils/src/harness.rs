// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full chat stack over a temp SQLite database
//! with [`MockGeneration`] standing in for Ollama. `send_message()` drives
//! one turn through the real orchestrator.

use std::sync::Arc;
use std::time::Duration;

use localmind_agent::{ChatOrchestrator, SessionEnricher, TaskPool, TurnOutcome};
use localmind_config::model::{EnricherConfig, LocalMindConfig, StorageConfig};
use localmind_core::{
    ActiveModel, GenerationClient, LocalMindError, RetrievalIndex, SessionLog, StorageAdapter,
};
use localmind_memory::SqliteRetrievalIndex;
use localmind_storage::SqliteStorage;

use crate::mock_generation::MockGeneration;
use crate::transport::ScriptedTransport;

/// How long `settle()` waits for background work.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<Vec<String>>,
    dimension: usize,
    search_limit: usize,
    enricher_enabled: bool,
    session_ttl_secs: u64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            dimension: 8,
            search_limit: 3,
            enricher_enabled: true,
            session_ttl_secs: 3600,
        }
    }

    /// Queue chat replies, one token list per turn.
    pub fn with_replies(mut self, replies: Vec<Vec<&str>>) -> Self {
        self.replies = replies
            .into_iter()
            .map(|tokens| tokens.into_iter().map(String::from).collect())
            .collect();
        self
    }

    /// Embedding dimension of both the mock and the fact index.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn without_enricher(mut self) -> Self {
        self.enricher_enabled = false;
        self
    }

    pub fn with_session_ttl(mut self, secs: u64) -> Self {
        self.session_ttl_secs = secs;
        self
    }

    /// Build the test harness with all subsystems initialized.
    pub async fn build(self) -> Result<TestHarness, LocalMindError> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| LocalMindError::Internal(format!("failed to create temp dir: {e}")))?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = LocalMindConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            session_ttl_secs: self.session_ttl_secs,
            ..StorageConfig::default()
        };
        config.retrieval.dimension = self.dimension;
        config.retrieval.search_limit = self.search_limit;
        config.enricher = EnricherConfig {
            enabled: self.enricher_enabled,
            delay_ms: 0,
            ..EnricherConfig::default()
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let index = Arc::new(SqliteRetrievalIndex::new(
            storage.database()?,
            config.retrieval.collection.clone(),
        ));
        index.ensure_schema(self.dimension).await?;

        let generation = Arc::new(MockGeneration::new(self.dimension));
        for tokens in self.replies {
            generation.push_reply(tokens).await;
        }

        let active_model = Arc::new(ActiveModel::new(config.ollama.default_model.clone()));
        let tasks = TaskPool::new();
        let log: Arc<dyn SessionLog> = storage.clone();
        let gen_client: Arc<dyn GenerationClient> = generation.clone();
        let enricher = Arc::new(SessionEnricher::new(
            log.clone(),
            gen_client.clone(),
            active_model.clone(),
            config.enricher.clone(),
        ));
        let orchestrator = Arc::new(ChatOrchestrator::new(
            log,
            index.clone(),
            gen_client,
            active_model.clone(),
            enricher,
            tasks.clone(),
            config.retrieval.search_limit,
        ));

        Ok(TestHarness {
            orchestrator,
            storage,
            index,
            generation,
            active_model,
            tasks,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock generation and temp storage.
pub struct TestHarness {
    pub orchestrator: Arc<ChatOrchestrator>,
    /// SQLite session log (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Fact index sharing the session log's database.
    pub index: Arc<SqliteRetrievalIndex>,
    pub generation: Arc<MockGeneration>,
    pub active_model: Arc<ActiveModel>,
    /// Pool the orchestrator submits upserts and titling to.
    pub tasks: TaskPool,
    pub config: LocalMindConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one turn on `session_id` and return its outcome plus the frames streamed.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<(TurnOutcome, Vec<String>), LocalMindError> {
        let mut transport = ScriptedTransport::default();
        let outcome = self
            .orchestrator
            .run_turn(session_id, text, &mut transport)
            .await?;
        Ok((outcome, transport.sent().to_vec()))
    }

    /// Wait for detached upserts and titling to finish.
    ///
    /// Closes the pool's tracker; later spawns still run and are awaited by
    /// the next call.
    pub async fn settle(&self) {
        self.tasks.shutdown(SETTLE_TIMEOUT).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localmind_core::Role;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.storage.list_sessions().await.unwrap().is_empty());
        assert_eq!(harness.index.dimension(), Some(8));
    }

    #[tokio::test]
    async fn send_message_streams_and_persists() {
        let harness = TestHarness::builder()
            .with_replies(vec![vec!["stored", " response"]])
            .without_enricher()
            .build()
            .await
            .unwrap();

        let (outcome, frames) = harness.send_message("s1", "store me").await.unwrap();
        assert_eq!(outcome.reply, "stored response");
        assert_eq!(frames, vec!["stored", " response"]);

        let history = harness.storage.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "store me");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "stored response");
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().without_enricher().build().await.unwrap();
        let h2 = TestHarness::builder().without_enricher().build().await.unwrap();

        h1.send_message("s", "msg1").await.unwrap();
        assert_eq!(h1.storage.list_sessions().await.unwrap().len(), 1);
        assert!(h2.storage.list_sessions().await.unwrap().is_empty());
    }
}
