// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use modelmux_core::ModelmuxError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations on the connection's worker thread.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history`
/// table, so repeated calls are no-ops.
pub async fn run_migrations(conn: &tokio_rusqlite::Connection) -> Result<(), ModelmuxError> {
    conn.call(|conn| -> Result<(), refinery::Error> {
        embedded::migrations::runner().run(conn)?;
        Ok(())
    })
    .await
    .map_err(|e| ModelmuxError::Storage {
        source: Box::new(e),
    })
}
