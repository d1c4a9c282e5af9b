// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `localmind serve` command implementation.
//!
//! Opens the SQLite session log and fact index, connects to Ollama, and
//! serves the gateway until SIGINT/SIGTERM. Background work is then drained
//! within `shutdown.drain_timeout_secs` before storage is checkpointed.

use std::sync::Arc;
use std::time::Duration;

use localmind_agent::{shutdown, ChatOrchestrator, SessionEnricher, TaskPool};
use localmind_config::LocalMindConfig;
use localmind_core::{
    ActiveModel, GenerationClient, HealthStatus, LocalMindError, PluginAdapter, RetrievalIndex,
    SessionLog, StorageAdapter,
};
use localmind_gateway::{start_server, GatewayState};
use localmind_memory::SqliteRetrievalIndex;
use localmind_ollama::OllamaGeneration;
use localmind_storage::SqliteStorage;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the `localmind serve` command.
pub async fn run_serve(config: LocalMindConfig) -> Result<(), LocalMindError> {
    init_tracing(config.app.effective_log_level());

    info!(service = %config.app.name, "starting localmind serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "session log opened");

    let index = Arc::new(SqliteRetrievalIndex::new(
        storage.database()?,
        config.retrieval.collection.clone(),
    ));
    index.ensure_schema(config.retrieval.dimension).await?;

    let ollama = Arc::new(OllamaGeneration::new(&config.ollama)?);
    match ollama.health_check().await {
        Ok(HealthStatus::Healthy) => {
            info!(url = %config.ollama.base_url, "ollama reachable");
            if let Some(actual) = embedding_dimension_mismatch(
                ollama.as_ref(),
                &config.ollama.default_model,
                config.retrieval.dimension,
            )
            .await
            {
                warn!(
                    model = %config.ollama.default_model,
                    configured = config.retrieval.dimension,
                    actual,
                    "embedding width differs from retrieval.dimension, facts will not be stored"
                );
            }
        }
        Ok(status) => warn!(
            url = %config.ollama.base_url,
            ?status,
            "ollama not healthy, chat replies will carry error tokens until it is"
        ),
        Err(e) => warn!(error = %e, "ollama health check failed"),
    }

    let active_model = Arc::new(ActiveModel::new(config.ollama.default_model.clone()));
    let tasks = TaskPool::new();
    let log: Arc<dyn SessionLog> = storage.clone();
    let generation: Arc<dyn GenerationClient> = ollama.clone();

    let enricher = Arc::new(SessionEnricher::new(
        log.clone(),
        generation.clone(),
        active_model.clone(),
        config.enricher.clone(),
    ));
    let orchestrator = Arc::new(ChatOrchestrator::new(
        log.clone(),
        index.clone(),
        generation.clone(),
        active_model.clone(),
        enricher,
        tasks.clone(),
        config.retrieval.search_limit,
    ));

    let cancel = shutdown::install_signal_handler();
    spawn_sweeper(
        &tasks,
        storage.clone(),
        Duration::from_secs(config.storage.sweep_interval_secs),
        cancel.clone(),
    );

    let state = GatewayState {
        app_name: config.app.name.clone(),
        orchestrator,
        sessions: log,
        index: index.clone(),
        generation,
        models: ollama.clone(),
        active_model,
        tasks: tasks.clone(),
        adapters: vec![
            storage.clone() as Arc<dyn PluginAdapter>,
            index as Arc<dyn PluginAdapter>,
            ollama as Arc<dyn PluginAdapter>,
        ],
    };

    let served = start_server(&config.gateway, state, cancel.clone()).await;
    // Stops the sweeper when the server exits on its own, e.g. a failed bind.
    cancel.cancel();

    let abandoned = tasks
        .shutdown(Duration::from_secs(config.shutdown.drain_timeout_secs))
        .await;
    if abandoned > 0 {
        warn!(abandoned, "some background work did not finish before shutdown");
    }

    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    info!("localmind serve shutdown complete");
    served
}

/// Embeds a short sample and returns the model's width when it differs from
/// `expected`. An embedding failure is not a mismatch.
async fn embedding_dimension_mismatch(
    generation: &dyn GenerationClient,
    model: &str,
    expected: usize,
) -> Option<usize> {
    match generation.embed(model, "dimension check").await {
        Ok(vector) if vector.len() != expected => Some(vector.len()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "embedding width check skipped");
            None
        }
    }
}

/// Purges expired sessions every `every` until `cancel` fires.
fn spawn_sweeper(
    tasks: &TaskPool,
    storage: Arc<SqliteStorage>,
    every: Duration,
    cancel: CancellationToken,
) {
    tasks.spawn("ttl-sweeper", async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("ttl sweeper stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = storage.purge_expired().await {
                        warn!(error = %e, "session sweep failed");
                    }
                }
            }
        }
    });
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("localmind={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use localmind_test_utils::MockGeneration;

    #[tokio::test]
    async fn embedding_width_check_reports_only_mismatches() {
        let generation = MockGeneration::new(4096);
        assert_eq!(
            embedding_dimension_mismatch(&generation, "llama3", 2048).await,
            Some(4096)
        );
        assert_eq!(
            embedding_dimension_mismatch(&generation, "llama3", 4096).await,
            None
        );
    }

    #[tokio::test]
    async fn failed_embedding_is_not_a_mismatch() {
        let generation = MockGeneration::new(8);
        generation.fail_all_embeddings().await;
        assert_eq!(
            embedding_dimension_mismatch(&generation, "llama3", 4096).await,
            None
        );
    }
}
