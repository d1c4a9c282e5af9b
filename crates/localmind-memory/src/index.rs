// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RetrievalIndex`] over the SQLite fact store.
//!
//! Similarity search is brute force: every embedding in the collection is
//! scored against the query by cosine similarity. The collection's dimension
//! is negotiated once at startup by [`RetrievalIndex::ensure_schema`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use localmind_core::{AdapterType, HealthStatus, LocalMindError, PluginAdapter, RetrievalIndex};
use localmind_storage::Database;

use crate::store::{FactStore, StoredDimension};
use crate::types::{rank_by_similarity, Fact, ScoredFact};

/// SQLite-backed retrieval index for one named collection.
pub struct SqliteRetrievalIndex {
    store: FactStore,
    collection: String,
    /// Zero until the schema dimension is known.
    dimension: AtomicUsize,
}

impl SqliteRetrievalIndex {
    /// Creates an index over `collection` in an already-migrated database.
    pub fn new(db: &Database, collection: impl Into<String>) -> Self {
        Self {
            store: FactStore::new(db.connection().clone()),
            collection: collection.into(),
            dimension: AtomicUsize::new(0),
        }
    }

    /// Name of the collection this index reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The schema dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        match self.dimension.load(Ordering::Acquire) {
            0 => None,
            d => Some(d),
        }
    }

    /// Number of facts in the collection.
    pub async fn count(&self) -> Result<usize, LocalMindError> {
        self.store.count(&self.collection).await
    }

    /// Like [`RetrievalIndex::search`], but keeps scores and surfaces errors.
    pub async fn search_scored(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredFact>, LocalMindError> {
        let dimension = self.schema_dimension().await?;
        if vector.len() != dimension {
            return Err(LocalMindError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let candidates: Vec<(String, Vec<f32>)> = self
            .store
            .embeddings(&self.collection)
            .await?
            .into_iter()
            .filter(|(_, embedding)| embedding.len() == dimension)
            .collect();
        Ok(rank_by_similarity(vector, candidates, limit))
    }

    /// Resolve the schema dimension, reading it from the store if this
    /// process has not negotiated it yet.
    async fn schema_dimension(&self) -> Result<usize, LocalMindError> {
        if let Some(d) = self.dimension() {
            return Ok(d);
        }
        match self.store.stored_dimension(&self.collection).await? {
            StoredDimension::Known(d) => {
                self.dimension.store(d, Ordering::Release);
                Ok(d)
            }
            _ => Err(LocalMindError::Internal(format!(
                "collection `{}` has no schema; call ensure_schema first",
                self.collection
            ))),
        }
    }
}

#[async_trait]
impl PluginAdapter for SqliteRetrievalIndex {
    fn name(&self) -> &str {
        "sqlite-facts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }

    async fn health_check(&self) -> Result<HealthStatus, LocalMindError> {
        if let Err(e) = self.store.ping().await {
            return Ok(HealthStatus::Unhealthy(e.to_string()));
        }
        match self.dimension() {
            Some(_) => Ok(HealthStatus::Healthy),
            None => Ok(HealthStatus::Degraded("schema not negotiated".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), LocalMindError> {
        Ok(())
    }
}

#[async_trait]
impl RetrievalIndex for SqliteRetrievalIndex {
    async fn ensure_schema(&self, dimension: usize) -> Result<(), LocalMindError> {
        if dimension == 0 {
            return Err(LocalMindError::Config(
                "retrieval dimension must be greater than 0".into(),
            ));
        }

        let now = chrono::Utc::now().timestamp();
        match self.store.stored_dimension(&self.collection).await? {
            StoredDimension::Known(d) if d == dimension => {
                debug!(collection = %self.collection, dimension, "retrieval schema up to date");
            }
            StoredDimension::Absent => {
                self.store
                    .recreate_collection(&self.collection, dimension, now)
                    .await?;
                info!(collection = %self.collection, dimension, "retrieval collection created");
            }
            StoredDimension::Known(old) => {
                let lost = self
                    .store
                    .recreate_collection(&self.collection, dimension, now)
                    .await?;
                warn!(
                    collection = %self.collection,
                    old_dimension = old,
                    new_dimension = dimension,
                    facts_lost = lost,
                    "embedding dimension changed, collection recreated and existing facts discarded"
                );
            }
            StoredDimension::Unverifiable => {
                let lost = self
                    .store
                    .recreate_collection(&self.collection, dimension, now)
                    .await?;
                warn!(
                    collection = %self.collection,
                    new_dimension = dimension,
                    facts_lost = lost,
                    "stored dimension unreadable, collection recreated and existing facts discarded"
                );
            }
        }

        self.dimension.store(dimension, Ordering::Release);
        Ok(())
    }

    async fn upsert(&self, text: &str, vector: &[f32]) -> Result<(), LocalMindError> {
        let dimension = self.schema_dimension().await?;
        if vector.len() != dimension {
            return Err(LocalMindError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }

        let fact = Fact {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            embedding: vector.to_vec(),
            created_at: chrono::Utc::now().timestamp(),
        };
        self.store.insert(&self.collection, &fact).await?;
        debug!(collection = %self.collection, fact_id = %fact.id, "fact stored");
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Vec<String> {
        match self.search_scored(vector, limit).await {
            Ok(scored) => scored.into_iter().map(|s| s.text).collect(),
            Err(e) => {
                warn!(collection = %self.collection, error = %e, "fact search failed, continuing without context");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup(collection: &str) -> (SqliteRetrievalIndex, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (SqliteRetrievalIndex::new(&db, collection), db, dir)
    }

    #[tokio::test]
    async fn plugin_identity() {
        let (index, _db, _dir) = setup("kb").await;
        assert_eq!(index.name(), "sqlite-facts");
        assert_eq!(index.adapter_type(), AdapterType::Retrieval);
        assert!(matches!(
            index.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn ensure_schema_creates_fresh_collection() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(3).await.unwrap();
        assert_eq!(index.dimension(), Some(3));
        assert_eq!(index.count().await.unwrap(), 0);
        assert_eq!(index.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn ensure_schema_same_dimension_keeps_facts() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(2).await.unwrap();
        index.upsert("keep me", &[1.0, 0.0]).await.unwrap();

        index.ensure_schema(2).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_schema_new_dimension_recreates() {
        let (index, db, _dir) = setup("kb").await;
        index.ensure_schema(4).await.unwrap();
        index.upsert("old", &[1.0, 0.0, 0.0, 0.0]).await.unwrap();

        // A fresh process configured with a different dimension.
        let restarted = SqliteRetrievalIndex::new(&db, "kb");
        restarted.ensure_schema(2).await.unwrap();
        assert_eq!(restarted.count().await.unwrap(), 0);
        restarted.upsert("new", &[0.0, 1.0]).await.unwrap();
        assert_eq!(restarted.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_schema_rejects_zero() {
        let (index, _db, _dir) = setup("kb").await;
        assert!(index.ensure_schema(0).await.is_err());
    }

    #[tokio::test]
    async fn upsert_wrong_length_is_dimension_mismatch() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(3).await.unwrap();

        let err = index.upsert("short", &[1.0, 2.0]).await.unwrap_err();
        assert!(matches!(
            err,
            LocalMindError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_without_schema_fails() {
        let (index, _db, _dir) = setup("kb").await;
        assert!(index.upsert("orphan", &[1.0]).await.is_err());
    }

    #[tokio::test]
    async fn search_returns_nearest_first() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(2).await.unwrap();
        index.upsert("east", &[1.0, 0.0]).await.unwrap();
        index.upsert("north", &[0.0, 1.0]).await.unwrap();
        index.upsert("north-east", &[1.0, 1.0]).await.unwrap();

        let hits = index.search(&[0.9, 0.1], 2).await;
        assert_eq!(hits, vec!["east".to_string(), "north-east".to_string()]);
    }

    #[tokio::test]
    async fn search_on_empty_index_is_empty() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(2).await.unwrap();
        assert!(index.search(&[1.0, 0.0], 3).await.is_empty());
    }

    #[tokio::test]
    async fn search_with_wrong_length_is_empty() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(2).await.unwrap();
        index.upsert("fact", &[1.0, 0.0]).await.unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 3).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_facts_are_stored_twice() {
        let (index, _db, _dir) = setup("kb").await;
        index.ensure_schema(2).await.unwrap();
        index.upsert("same", &[1.0, 0.0]).await.unwrap();
        index.upsert("same", &[1.0, 0.0]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let (index, db, _dir) = setup("a").await;
        let other = SqliteRetrievalIndex::new(&db, "b");
        index.ensure_schema(2).await.unwrap();
        other.ensure_schema(2).await.unwrap();
        index.upsert("only in a", &[1.0, 0.0]).await.unwrap();

        assert!(other.search(&[1.0, 0.0], 3).await.is_empty());
    }

    mod properties {
        use super::*;
        use crate::types::cosine_similarity;
        use proptest::prelude::*;

        const DIM: usize = 8;

        fn runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn stored_vector_is_its_own_nearest_fact(
                v in prop::collection::vec(-10.0_f32..10.0, DIM),
                w in prop::collection::vec(-10.0_f32..10.0, DIM),
            ) {
                prop_assume!(v.iter().map(|x| x * x).sum::<f32>() > 0.01);
                prop_assume!(cosine_similarity(&v, &w) < 0.999);

                let hits = runtime().block_on(async {
                    let (index, _db, _dir) = setup("kb").await;
                    index.ensure_schema(DIM).await.unwrap();
                    index.upsert("distractor", &w).await.unwrap();
                    index.upsert("target", &v).await.unwrap();
                    let opposite: Vec<f32> = v.iter().map(|x| -x).collect();
                    index.upsert("opposite", &opposite).await.unwrap();
                    index.search(&v, 1).await
                });
                prop_assert_eq!(hits, vec!["target".to_string()]);
            }
        }
    }
}
