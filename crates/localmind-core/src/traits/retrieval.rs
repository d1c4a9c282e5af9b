// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity-search store over embedded facts.

use async_trait::async_trait;

use crate::error::LocalMindError;
use crate::traits::adapter::PluginAdapter;

/// A vector index of facts with a single fixed dimension.
#[async_trait]
pub trait RetrievalIndex: PluginAdapter {
    /// Creates the collection, or destroys and recreates it when the stored
    /// dimension differs from `dimension`. Facts are lost on recreation.
    async fn ensure_schema(&self, dimension: usize) -> Result<(), LocalMindError>;

    /// Stores a fact under a fresh identifier.
    ///
    /// Fails with [`LocalMindError::DimensionMismatch`] when the vector length
    /// disagrees with the schema.
    async fn upsert(&self, text: &str, vector: &[f32]) -> Result<(), LocalMindError>;

    /// Returns fact texts nearest-first by cosine similarity.
    ///
    /// An empty or unreachable index yields an empty result.
    async fn search(&self, vector: &[f32], limit: usize) -> Vec<String>;
}
