// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Local-Mind.

use thiserror::Error;

/// The primary error type used across all Local-Mind adapter traits and the chat pipeline.
#[derive(Debug, Error)]
pub enum LocalMindError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The session log or metadata store could not be reached or failed a query.
    #[error("persistence unavailable: {source}")]
    PersistenceUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A vector's length disagrees with the retrieval index schema.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding backend returned no usable vector.
    #[error("embedding failed: {message}")]
    EmbeddingFailure {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The chat backend is unreachable or the requested model is missing.
    #[error("generation unavailable: {message}")]
    GenerationUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The client side of a chat connection went away.
    #[error("transport closed")]
    TransportClosed,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LocalMindError {
    /// Wraps any backend error as [`LocalMindError::PersistenceUnavailable`].
    pub fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LocalMindError::PersistenceUnavailable {
            source: Box::new(err),
        }
    }

    /// True for errors that end a chat connection rather than degrading a turn.
    pub fn is_transport_closed(&self) -> bool {
        matches!(self, LocalMindError::TransportClosed)
    }
}
