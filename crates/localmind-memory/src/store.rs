// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed fact store with vector BLOB storage.

use localmind_core::LocalMindError;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use crate::types::{blob_to_vec, vec_to_blob, Fact};

/// Helper to convert tokio_rusqlite errors into [`LocalMindError::PersistenceUnavailable`].
fn storage_err(e: tokio_rusqlite::Error) -> LocalMindError {
    LocalMindError::persistence(e)
}

/// What the `collections` table says about a collection's dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredDimension {
    /// No row for the collection.
    Absent,
    /// A positive integer dimension.
    Known(usize),
    /// A row exists but its dimension is not a positive integer.
    Unverifiable,
}

/// Persistent store for the facts of one or more named collections.
///
/// The connection must already have the knowledge migration applied.
pub struct FactStore {
    conn: Connection,
}

impl FactStore {
    /// Creates a new FactStore wrapping an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Read the recorded dimension of `collection`.
    pub async fn stored_dimension(&self, collection: &str) -> Result<StoredDimension, LocalMindError> {
        let collection = collection.to_string();
        self.conn
            .call(move |conn| {
                let value: Option<rusqlite::types::Value> = conn
                    .query_row(
                        "SELECT dimension FROM collections WHERE name = ?1",
                        params![collection],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(match value {
                    None => StoredDimension::Absent,
                    Some(rusqlite::types::Value::Integer(d)) if d > 0 => {
                        usize::try_from(d).map_or(StoredDimension::Unverifiable, StoredDimension::Known)
                    }
                    Some(_) => StoredDimension::Unverifiable,
                })
            })
            .await
            .map_err(storage_err)
    }

    /// Delete every fact of `collection` and record `dimension` for it, atomically.
    ///
    /// Returns the number of facts removed.
    pub async fn recreate_collection(
        &self,
        collection: &str,
        dimension: usize,
        now: i64,
    ) -> Result<usize, LocalMindError> {
        let collection = collection.to_string();
        let dimension = i64::try_from(dimension)
            .map_err(|_| LocalMindError::Internal(format!("dimension {dimension} too large")))?;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let removed =
                    tx.execute("DELETE FROM facts WHERE collection = ?1", params![collection])?;
                tx.execute(
                    "INSERT INTO collections (name, dimension, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET dimension = excluded.dimension,
                                                     created_at = excluded.created_at",
                    params![collection, dimension, now],
                )?;
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(storage_err)
    }

    /// Insert a fact into `collection`.
    pub async fn insert(&self, collection: &str, fact: &Fact) -> Result<(), LocalMindError> {
        let collection = collection.to_string();
        let id = fact.id.clone();
        let text = fact.text.clone();
        let blob = vec_to_blob(&fact.embedding);
        let created_at = fact.created_at;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO facts (id, collection, text, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, collection, text, blob, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Load `(text, embedding)` pairs for every fact in `collection`.
    pub async fn embeddings(&self, collection: &str) -> Result<Vec<(String, Vec<f32>)>, LocalMindError> {
        let collection = collection.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT text, embedding FROM facts WHERE collection = ?1")?;
                let rows = stmt
                    .query_map(params![collection], |row| {
                        let text: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((text, blob_to_vec(&blob)))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(storage_err)
    }

    /// Number of facts in `collection`.
    pub async fn count(&self, collection: &str) -> Result<usize, LocalMindError> {
        let collection = collection.to_string();
        self.conn
            .call(move |conn| {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM facts WHERE collection = ?1",
                    params![collection],
                    |row| row.get(0),
                )?;
                Ok(usize::try_from(n).unwrap_or(0))
            })
            .await
            .map_err(storage_err)
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<(), LocalMindError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}
