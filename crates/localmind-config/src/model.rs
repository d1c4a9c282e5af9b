// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Local-Mind.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Local-Mind configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalMindConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// HTTP/WebSocket listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Session log storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Long-term fact index settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Ollama generation backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Background session titling.
    #[serde(default)]
    pub enricher: EnricherConfig,

    /// Graceful shutdown settings.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Service name reported by the health endpoint.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Forces debug-level logging when true.
    #[serde(default)]
    pub debug: bool,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            debug: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// The level actually used for the `localmind` tracing target.
    pub fn effective_log_level(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }
}

fn default_app_name() -> String {
    "Local-Mind".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin. The bundled web UI runs on a different port.
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

/// Session log storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Idle time after which a session and its log expire. Any write resets it.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How often expired sessions are physically purged.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            session_ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("localmind").join("localmind.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("localmind.db"))
        .to_string_lossy()
        .to_string()
}

fn default_session_ttl_secs() -> u64 {
    86_400
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Long-term fact index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Name of the fact collection.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Embedding dimension; must match the embedding model. Changing it wipes
    /// the collection at next startup.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Facts injected per turn.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            dimension: default_dimension(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_collection() -> String {
    "knowledge_base".to_string()
}

fn default_dimension() -> usize {
    4096
}

fn default_search_limit() -> usize {
    3
}

/// Ollama generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Model selected at startup. Can be changed at runtime.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Upper bound for a single embedding request.
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// TCP connect timeout for every request. Chat streams have no overall timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries on 429/500/503 before a request is given up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            default_model: default_model(),
            embed_timeout_secs: default_embed_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_embed_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    1
}

/// Background session titling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnricherConfig {
    /// Derive a title from each session's first message.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Head start given to the reply stream before titling begins.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Titles longer than this are truncated.
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: default_delay_ms(),
            max_title_chars: default_max_title_chars(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_max_title_chars() -> usize {
    60
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShutdownConfig {
    /// How long background tasks may run after a shutdown signal.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_drain_timeout_secs() -> u64 {
    10
}
