// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use modelmux_core::ModelmuxError;
use tracing::debug;

/// Handle to the SQLite database.
///
/// Wraps a single `tokio_rusqlite::Connection`. Query modules accept
/// `&Database` and call through [`Database::connection`].
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, apply PRAGMAs,
    /// and run any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ModelmuxError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ModelmuxError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ModelmuxError::Storage {
                source: Box::new(e),
            })?;

        let db = Self { conn };
        db.initialize().await?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database with the full schema applied.
    ///
    /// Used by tests across the workspace.
    pub async fn open_in_memory() -> Result<Self, ModelmuxError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| ModelmuxError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), ModelmuxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        crate::migrations::run_migrations(&self.conn).await
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL. Called on graceful shutdown.
    pub async fn close(&self) -> Result<(), ModelmuxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite call error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ModelmuxError {
    ModelmuxError::Storage {
        source: Box::new(e),
    }
}
