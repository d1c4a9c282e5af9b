// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session metadata operations.

use localmind_core::{LocalMindError, SessionMeta};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

fn row_to_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionMeta> {
    Ok(SessionMeta {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Insert a new session with the given expiry.
pub async fn insert_session(
    db: &Database,
    meta: &SessionMeta,
    expires_at: i64,
) -> Result<(), LocalMindError> {
    let meta = meta.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, title, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![meta.id, meta.title, meta.created_at, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a live session by ID.
pub async fn get_session(
    db: &Database,
    id: &str,
    now: i64,
) -> Result<Option<SessionMeta>, LocalMindError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let meta = conn
                .query_row(
                    "SELECT id, title, created_at FROM sessions WHERE id = ?1 AND expires_at > ?2",
                    params![id, now],
                    row_to_meta,
                )
                .optional()?;
            Ok(meta)
        })
        .await
        .map_err(map_tr_err)
}

/// List live sessions, newest first.
pub async fn list_sessions(db: &Database, now: i64) -> Result<Vec<SessionMeta>, LocalMindError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, created_at FROM sessions
                 WHERE expires_at > ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let sessions = stmt
                .query_map(params![now], row_to_meta)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite a live session's title and push its expiry forward.
///
/// Returns whether a session was updated.
pub async fn update_title(
    db: &Database,
    id: &str,
    title: &str,
    now: i64,
    expires_at: i64,
) -> Result<bool, LocalMindError> {
    let id = id.to_string();
    let title = title.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions SET title = ?1, expires_at = ?2 WHERE id = ?3 AND expires_at > ?4",
                params![title, expires_at, id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a session's metadata and messages. Deleting a missing session is not an error.
pub async fn delete_session(db: &Database, id: &str) -> Result<(), LocalMindError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM messages WHERE session_id = ?1", params![id])?;
            tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Physically remove every expired session and its messages.
///
/// Returns the number of sessions removed.
pub async fn purge_expired(db: &Database, now: i64) -> Result<usize, LocalMindError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM messages WHERE session_id IN
                    (SELECT id FROM sessions WHERE expires_at <= ?1)",
                params![now],
            )?;
            let removed = tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn meta(id: &str, title: &str, created_at: i64) -> SessionMeta {
        SessionMeta {
            id: id.to_string(),
            title: title.to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_and_get_session_roundtrips() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("s-1", "Trip plans", 100), 200).await.unwrap();

        let got = get_session(&db, "s-1", 150).await.unwrap().unwrap();
        assert_eq!(got, meta("s-1", "Trip plans", 100));
        assert!(get_session(&db, "missing", 150).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("old", "Old", 100), 200).await.unwrap();

        assert!(get_session(&db, "old", 200).await.unwrap().is_none());
        assert!(list_sessions(&db, 250).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_sessions_is_newest_first() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("a", "A", 10), 1_000).await.unwrap();
        insert_session(&db, &meta("c", "C", 30), 1_000).await.unwrap();
        insert_session(&db, &meta("b", "B", 20), 1_000).await.unwrap();

        let ids: Vec<String> = list_sessions(&db, 50)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn update_title_reports_missing_session() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("s", "New Chat", 10), 100).await.unwrap();

        assert!(update_title(&db, "s", "Renamed", 50, 500).await.unwrap());
        assert!(!update_title(&db, "ghost", "Nope", 50, 500).await.unwrap());
        assert_eq!(get_session(&db, "s", 400).await.unwrap().unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn purge_expired_removes_only_expired() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("dead", "D", 1), 10).await.unwrap();
        insert_session(&db, &meta("live", "L", 1), 1_000).await.unwrap();

        assert_eq!(purge_expired(&db, 100).await.unwrap(), 1);
        assert_eq!(purge_expired(&db, 100).await.unwrap(), 0);
        assert!(get_session(&db, "live", 100).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_session_twice_is_fine() {
        let (db, _dir) = setup_db().await;
        insert_session(&db, &meta("s", "S", 1), 1_000).await.unwrap();
        delete_session(&db, "s").await.unwrap();
        delete_session(&db, "s").await.unwrap();
        assert!(get_session(&db, "s", 2).await.unwrap().is_none());
    }
}
