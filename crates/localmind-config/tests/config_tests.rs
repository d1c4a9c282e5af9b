// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Local-Mind configuration system.

use std::io::Write;

use localmind_config::diagnostic::ConfigError;
use localmind_config::model::LocalMindConfig;
use localmind_config::{
    load_and_validate_path, load_and_validate_str, load_config, load_config_from_str,
};

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[app]
name = "Local-Mind Dev"
debug = true
log_level = "warn"

[gateway]
host = "0.0.0.0"
port = 9000
cors_permissive = false

[storage]
database_path = "/tmp/localmind-test.db"
wal_mode = false
session_ttl_secs = 600
sweep_interval_secs = 30

[retrieval]
collection = "facts"
dimension = 4096
search_limit = 5

[ollama]
base_url = "http://ollama:11434"
default_model = "gemma:2b"
embed_timeout_secs = 5
connect_timeout_secs = 2
max_retries = 0

[enricher]
enabled = false
delay_ms = 0
max_title_chars = 40

[shutdown]
drain_timeout_secs = 3
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "Local-Mind Dev");
    assert!(config.app.debug);
    assert_eq!(config.app.effective_log_level(), "debug");
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert!(!config.gateway.cors_permissive);
    assert_eq!(config.storage.session_ttl_secs, 600);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.retrieval.collection, "facts");
    assert_eq!(config.retrieval.dimension, 4096);
    assert_eq!(config.retrieval.search_limit, 5);
    assert_eq!(config.ollama.base_url, "http://ollama:11434");
    assert_eq!(config.ollama.default_model, "gemma:2b");
    assert_eq!(config.ollama.max_retries, 0);
    assert!(!config.enricher.enabled);
    assert_eq!(config.enricher.max_title_chars, 40);
    assert_eq!(config.shutdown.drain_timeout_secs, 3);
}

/// Sections left out of the file keep their defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("[ollama]\ndefault_model = \"mistral\"\n").unwrap();
    assert_eq!(config.ollama.default_model, "mistral");
    assert_eq!(config.ollama.base_url, "http://localhost:11434");
    assert_eq!(config.retrieval.dimension, 4096);
    assert_eq!(config.app.name, "Local-Mind");
}

/// Unknown fields are rejected rather than ignored.
#[test]
fn unknown_field_in_section_produces_error() {
    let err = load_config_from_str("[retrieval]\ndimesion = 1024\n")
        .expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("dimesion"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// Unknown top-level sections are rejected too.
#[test]
fn deny_unknown_fields_at_top_level() {
    let result = load_config_from_str("[redis]\nurl = \"redis://localhost\"\n");
    assert!(result.is_err(), "unknown section should be rejected");
}

/// The diagnostic for a typo carries the suggestion and the valid keys.
#[test]
fn diagnostic_error_includes_suggestion_and_valid_keys() {
    let errors = load_and_validate_str("[ollama]\nbase_ulr = \"http://x\"\n")
        .expect_err("should produce errors");

    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "base_ulr"
                && suggestion.as_deref() == Some("base_url")
                && valid_keys.contains("default_model")
        })
    });
    assert!(found, "expected UnknownKey for base_ulr, got: {errors:?}");
}

/// Wrong value types become InvalidType diagnostics.
#[test]
fn diagnostic_invalid_type_message() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n")
        .expect_err("should produce errors");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected InvalidType, got: {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[retrieval]\ndimension = 0\n")
        .expect_err("zero dimension should fail validation");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("dimension"))
    ));
}

/// ConfigError renders through miette with its help text.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "base_ulr".to_string(),
        suggestion: Some("base_url".to_string()),
        valid_keys: "base_url, default_model".to_string(),
        span: None,
        src: None,
    };

    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `base_url`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("base_ulr"));
}

/// An explicit config file is honoured.
#[test]
fn load_and_validate_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[gateway]\nport = 8123").unwrap();

    let config = load_and_validate_path(file.path()).expect("file should load");
    assert_eq!(config.gateway.port, 8123);
}

/// Environment variables map onto dotted keys, including keys with underscores.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "localmind.toml",
            "[ollama]\nbase_url = \"http://from-file:11434\"\n",
        )?;
        jail.set_env("LOCALMIND_OLLAMA_BASE_URL", "http://from-env:11434");
        jail.set_env("LOCALMIND_STORAGE_SESSION_TTL_SECS", "120");
        jail.set_env("LOCALMIND_APP_DEBUG", "true");

        let config: LocalMindConfig = load_config()?;
        assert_eq!(config.ollama.base_url, "http://from-env:11434");
        assert_eq!(config.storage.session_ttl_secs, 120);
        assert!(config.app.debug);
        Ok(())
    });
}
