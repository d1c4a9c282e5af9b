// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over the production adapters.
//!
//! Each test wires SQLite storage, the SQLite fact index, and the Ollama
//! adapter (pointed at a wiremock server) into a real orchestrator, the same
//! way `localmind serve` does. Tests are independent and order-insensitive.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use localmind_agent::{ChatOrchestrator, SessionEnricher, TaskPool};
use localmind_config::model::{EnricherConfig, OllamaConfig, StorageConfig};
use localmind_core::{
    ActiveModel, GenerationClient, RetrievalIndex, Role, SessionLog, StorageAdapter,
};
use localmind_memory::SqliteRetrievalIndex;
use localmind_ollama::OllamaGeneration;
use localmind_storage::SqliteStorage;
use localmind_test_utils::ScriptedTransport;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    storage: Arc<SqliteStorage>,
    index: Arc<SqliteRetrievalIndex>,
    orchestrator: ChatOrchestrator,
    tasks: TaskPool,
}

impl Stack {
    async fn open(db_path: &Path, base_url: &str, dimension: usize) -> Self {
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..StorageConfig::default()
        }));
        storage.initialize().await.unwrap();

        let index = Arc::new(SqliteRetrievalIndex::new(
            storage.database().unwrap(),
            "knowledge_base",
        ));
        index.ensure_schema(dimension).await.unwrap();

        let ollama: Arc<dyn GenerationClient> = Arc::new(
            OllamaGeneration::new(&OllamaConfig {
                base_url: base_url.to_string(),
                embed_timeout_secs: 2,
                connect_timeout_secs: 1,
                ..OllamaConfig::default()
            })
            .unwrap(),
        );
        let active_model = Arc::new(ActiveModel::new("llama3"));
        let tasks = TaskPool::new();
        let log: Arc<dyn SessionLog> = storage.clone();
        let enricher = Arc::new(SessionEnricher::new(
            log.clone(),
            ollama.clone(),
            active_model.clone(),
            EnricherConfig {
                enabled: false,
                ..EnricherConfig::default()
            },
        ));
        let orchestrator = ChatOrchestrator::new(
            log,
            index.clone(),
            ollama,
            active_model,
            enricher,
            tasks.clone(),
            3,
        );

        Self {
            storage,
            index,
            orchestrator,
            tasks,
        }
    }

    async fn chat(&self, session_id: &str, text: &str) -> Vec<String> {
        let mut transport = ScriptedTransport::new([text]);
        self.orchestrator
            .run_connection(session_id, &mut transport)
            .await;
        self.tasks.shutdown(Duration::from_secs(5)).await;
        transport.sent().to_vec()
    }
}

fn ndjson(tokens: &[&str]) -> String {
    let mut body = String::new();
    for token in tokens {
        body.push_str(
            &json!({"message": {"role": "assistant", "content": token}, "done": false})
                .to_string(),
        );
        body.push('\n');
    }
    body.push_str(&json!({"message": {"role": "assistant", "content": ""}, "done": true}).to_string());
    body.push('\n');
    body
}

async fn ollama_mock(dimension: usize, tokens: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"embedding": vec![0.25_f32; dimension]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(tokens)))
        .mount(&server)
        .await;
    server
}

async fn chat_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/api/chat")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn turn_streams_tokens_and_persists_everything() {
    let dir = tempfile::tempdir().unwrap();
    let server = ollama_mock(16, &["Hello", ", Ido"]).await;
    let stack = Stack::open(&dir.path().join("lm.db"), &server.uri(), 16).await;

    let frames = stack.chat("s1", "My name is Ido").await;
    assert_eq!(frames, vec!["Hello", ", Ido"]);

    let history = stack.storage.history("s1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Hello, Ido");
    assert_eq!(stack.index.count().await.unwrap(), 1);

    let bodies = chat_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "llama3");
    assert_eq!(bodies[0]["stream"], true);
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(
        bodies[0]["messages"][0]["content"],
        "You are Local-Mind, a helpful AI assistant."
    );
    assert_eq!(bodies[0]["messages"][1]["content"], "My name is Ido");
}

#[tokio::test]
async fn facts_from_one_session_reach_another() {
    let dir = tempfile::tempdir().unwrap();
    let server = ollama_mock(16, &["ok"]).await;
    let stack = Stack::open(&dir.path().join("lm.db"), &server.uri(), 16).await;

    stack.chat("first", "My name is Ido").await;
    stack.chat("second", "What is my name?").await;

    let bodies = chat_bodies(&server).await;
    let system = bodies[1]["messages"][0]["content"].as_str().unwrap();
    assert_eq!(
        system,
        "You are Local-Mind, a helpful AI assistant.\nRelevant Context from Memory:\nMy name is Ido"
    );
    // The second session starts with only its own question.
    assert_eq!(bodies[1]["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unreachable_ollama_yields_error_token_reply() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on the discard port.
    let stack = Stack::open(&dir.path().join("lm.db"), "http://127.0.0.1:9", 16).await;

    let frames = stack.chat("s1", "hello").await;
    assert_eq!(frames.len(), 1);
    assert!(
        frames[0].starts_with("[Error] The generation service is unavailable:"),
        "unexpected frame: {}",
        frames[0]
    );

    let history = stack.storage.history("s1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, frames[0]);
    assert_eq!(stack.index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_model_yields_not_found_token() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;
    let stack = Stack::open(&dir.path().join("lm.db"), &server.uri(), 16).await;

    let frames = stack.chat("s1", "hello").await;
    assert_eq!(
        frames,
        vec!["[Error] Model 'llama3' was not found. Pull it before chatting."]
    );
}

#[tokio::test]
async fn dimension_change_wipes_collection_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("lm.db");

    {
        let server = ollama_mock(4096, &["ok"]).await;
        let stack = Stack::open(&db, &server.uri(), 4096).await;
        stack.chat("s1", "stored under the old model").await;
        assert_eq!(stack.index.count().await.unwrap(), 1);
        stack.storage.close().await.unwrap();
    }

    let server = ollama_mock(2048, &["ok"]).await;
    let stack = Stack::open(&db, &server.uri(), 2048).await;
    assert_eq!(stack.index.dimension(), Some(2048));
    assert_eq!(stack.index.count().await.unwrap(), 0);

    // Session logs are unaffected by the index rebuild.
    assert_eq!(stack.storage.history("s1").await.len(), 2);

    stack.chat("s2", "stored under the new model").await;
    assert_eq!(stack.index.count().await.unwrap(), 1);
    let bodies = chat_bodies(&server).await;
    assert_eq!(bodies[0]["messages"][0]["content"], "You are Local-Mind, a helpful AI assistant.");
}

#[tokio::test]
async fn same_dimension_restart_keeps_facts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("lm.db");
    let server = ollama_mock(16, &["ok"]).await;

    {
        let stack = Stack::open(&db, &server.uri(), 16).await;
        stack.chat("s1", "I prefer green tea").await;
        stack.storage.close().await.unwrap();
    }

    let stack = Stack::open(&db, &server.uri(), 16).await;
    assert_eq!(stack.index.count().await.unwrap(), 1);
    stack.chat("s2", "What do I drink?").await;

    let bodies = chat_bodies(&server).await;
    let system = bodies.last().unwrap()["messages"][0]["content"].as_str().unwrap();
    assert!(system.ends_with("I prefer green tea"));
}
