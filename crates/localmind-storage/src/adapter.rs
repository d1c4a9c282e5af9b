// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`SessionLog`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use localmind_config::model::StorageConfig;
use localmind_core::{
    AdapterType, ChatMessage, HealthStatus, LocalMindError, PluginAdapter, SessionLog,
    SessionMeta, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed session log.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]. Every
/// write pushes the session's expiry to `now + session_ttl_secs`.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](StorageAdapter::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, LocalMindError> {
        self.db.get().ok_or_else(|| {
            LocalMindError::Internal("storage not initialized -- call initialize() first".into())
        })
    }

    fn ttl(&self) -> i64 {
        i64::try_from(self.config.session_ttl_secs).unwrap_or(i64::MAX)
    }

    fn expiry_from(&self, now: i64) -> i64 {
        now.saturating_add(self.ttl())
    }

    /// Physically remove expired sessions. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, LocalMindError> {
        let removed = queries::sessions::purge_expired(self.database()?, now()).await?;
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        Ok(removed)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionLog
    }

    async fn health_check(&self) -> Result<HealthStatus, LocalMindError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        match probe {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), LocalMindError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LocalMindError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| LocalMindError::Internal("storage already initialized".into()))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LocalMindError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl SessionLog for SqliteStorage {
    async fn append(&self, session_id: &str, message: ChatMessage) -> Result<(), LocalMindError> {
        let now = now();
        queries::messages::append_message(
            self.database()?,
            session_id,
            &message,
            now,
            self.expiry_from(now),
        )
        .await
    }

    async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        let result = match self.database() {
            Ok(db) => queries::messages::get_history(db, session_id, now()).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(session_id, error = %e, "history read failed, continuing with empty history");
            Vec::new()
        })
    }

    async fn create_session(&self, title: &str) -> Result<SessionMeta, LocalMindError> {
        let now = now();
        let meta = SessionMeta {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: now,
        };
        queries::sessions::insert_session(self.database()?, &meta, self.expiry_from(now)).await?;
        debug!(session_id = %meta.id, "session created");
        Ok(meta)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionMeta>, LocalMindError> {
        queries::sessions::get_session(self.database()?, session_id, now()).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionMeta>, LocalMindError> {
        queries::sessions::list_sessions(self.database()?, now()).await
    }

    async fn update_title(&self, session_id: &str, title: &str) -> Result<(), LocalMindError> {
        let now = now();
        let updated = queries::sessions::update_title(
            self.database()?,
            session_id,
            title,
            now,
            self.expiry_from(now),
        )
        .await?;
        if !updated {
            debug!(session_id, "update_title on missing session ignored");
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), LocalMindError> {
        queries::sessions::delete_session(self.database()?, session_id).await
    }
}
