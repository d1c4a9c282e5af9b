// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./localmind.toml` > `~/.config/localmind/localmind.toml`
//! > `/etc/localmind/localmind.toml` with environment variable overrides via the
//! `LOCALMIND_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LocalMindConfig;

/// Config sections, used to map `LOCALMIND_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "app", "gateway", "storage", "retrieval", "ollama", "enricher", "shutdown",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/localmind/localmind.toml` (system-wide)
/// 3. `~/.config/localmind/localmind.toml` (user XDG config)
/// 4. `./localmind.toml` (local directory)
/// 5. `LOCALMIND_*` environment variables
pub fn load_config() -> Result<LocalMindConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LocalMindConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LocalMindConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LocalMindConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LocalMindConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LocalMindConfig::default()))
        .merge(Toml::file("/etc/localmind/localmind.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("localmind/localmind.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("localmind.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LOCALMIND_OLLAMA_BASE_URL` must map to `ollama.base_url`, not
/// `ollama.base.url`.
fn env_provider() -> Env {
    Env::prefixed("LOCALMIND_")
        .map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Maps a lowercased, prefix-stripped env key to its dotted config path.
///
/// `Env::map` hands over the key with its original casing, so callers lowercase first.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
