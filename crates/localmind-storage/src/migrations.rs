// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! every time a [`Database`](crate::Database) is opened.

use localmind_core::LocalMindError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), LocalMindError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(LocalMindError::persistence)?;
    for migration in report.applied_migrations() {
        tracing::info!(name = %migration.name(), version = migration.version(), "applied migration");
    }
    Ok(())
}
