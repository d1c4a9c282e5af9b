// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.

use std::str::FromStr;

use localmind_core::{ChatMessage, LocalMindError, Role, DEFAULT_SESSION_TITLE};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Append a message to a session's log and push the session's expiry forward.
///
/// An unknown session is created with the default title. A session whose TTL
/// has lapsed starts over with an empty log, as an expired key would.
pub async fn append_message(
    db: &Database,
    session_id: &str,
    message: &ChatMessage,
    now: i64,
    expires_at: i64,
) -> Result<(), LocalMindError> {
    let session_id = session_id.to_string();
    let role = message.role.to_string();
    let content = message.content.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM messages WHERE session_id IN
                    (SELECT id FROM sessions WHERE id = ?1 AND expires_at <= ?2)",
                params![session_id, now],
            )?;
            tx.execute(
                "DELETE FROM sessions WHERE id = ?1 AND expires_at <= ?2",
                params![session_id, now],
            )?;
            tx.execute(
                "INSERT INTO sessions (id, title, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET expires_at = excluded.expires_at",
                params![session_id, DEFAULT_SESSION_TITLE, now, expires_at],
            )?;
            tx.execute(
                "INSERT INTO messages (session_id, role, content) VALUES (?1, ?2, ?3)",
                params![session_id, role, content],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a live session's messages in insertion order.
pub async fn get_history(
    db: &Database,
    session_id: &str,
    now: i64,
) -> Result<Vec<ChatMessage>, LocalMindError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.role, m.content FROM messages m
                 JOIN sessions s ON s.id = m.session_id
                 WHERE m.session_id = ?1 AND s.expires_at > ?2
                 ORDER BY m.seq ASC",
            )?;
            let messages = stmt
                .query_map(params![session_id, now], |row| {
                    let role: String = row.get(0)?;
                    let role = Role::from_str(&role).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(ChatMessage {
                        role,
                        content: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
