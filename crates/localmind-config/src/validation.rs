// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-empty paths, and positive sizes.

use crate::diagnostic::ConfigError;
use crate::model::LocalMindConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LocalMindConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` is not one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must not be 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.session_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.session_ttl_secs must be greater than 0".to_string(),
        });
    }

    if config.storage.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.sweep_interval_secs must be greater than 0".to_string(),
        });
    }

    if config.retrieval.collection.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "retrieval.collection must not be empty".to_string(),
        });
    }

    if config.retrieval.dimension == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.dimension must be greater than 0".to_string(),
        });
    }

    if config.retrieval.search_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.search_limit must be greater than 0".to_string(),
        });
    }

    let url = config.ollama.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("ollama.base_url `{url}` must start with http:// or https://"),
        });
    }

    if config.ollama.default_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ollama.default_model must not be empty".to_string(),
        });
    }

    if config.ollama.embed_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "ollama.embed_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.enricher.max_title_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "enricher.max_title_chars must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
