// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so the
//! [`Database`] handle is the only writer. Clone the inner connection to share
//! it; do not open a second connection for writes.

use std::path::Path;

use localmind_core::LocalMindError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert tokio-rusqlite errors into [`LocalMindError::PersistenceUnavailable`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> LocalMindError {
    LocalMindError::persistence(e)
}

/// An open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LocalMindError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(LocalMindError::persistence)?;
        }

        let conn = Connection::open(path).await.map_err(LocalMindError::persistence)?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        conn.call(move |conn| -> Result<Result<(), LocalMindError>, rusqlite::Error> {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal_mode};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;"
            ))?;
            Ok(migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        debug!(path, journal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying connection, for query modules and sibling stores.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), LocalMindError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), LocalMindError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}
