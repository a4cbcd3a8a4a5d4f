// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connected-provider operations.
//!
//! Provider rows are soft-deleted: disconnecting sets `is_active = 0` and the
//! row (with its credential and connect timestamp) is kept for reactivation.

use modelmux_core::types::now_iso8601;
use modelmux_core::ModelmuxError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ConnectedProvider;

const COLUMNS: &str = "id, user_id, provider, credential, is_active, connected_at";

fn provider_from_row(row: &rusqlite::Row<'_>) -> Result<ConnectedProvider, rusqlite::Error> {
    Ok(ConnectedProvider {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: row.get(2)?,
        credential: row.get(3)?,
        is_active: row.get(4)?,
        connected_at: row.get(5)?,
    })
}

/// All provider rows for a user, active or not, oldest first.
pub async fn list(db: &Database, user_id: &str) -> Result<Vec<ConnectedProvider>, ModelmuxError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ConnectedProvider>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM user_providers WHERE user_id = ?1 ORDER BY connected_at"
            ))?;
            let rows = stmt.query_map(params![user_id], provider_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active provider rows for a user.
pub async fn list_active(
    db: &Database,
    user_id: &str,
) -> Result<Vec<ConnectedProvider>, ModelmuxError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ConnectedProvider>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM user_providers
                 WHERE user_id = ?1 AND is_active = 1 ORDER BY connected_at"
            ))?;
            let rows = stmt.query_map(params![user_id], provider_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find one provider row by name.
pub async fn find(
    db: &Database,
    user_id: &str,
    provider: &str,
) -> Result<Option<ConnectedProvider>, ModelmuxError> {
    let user_id = user_id.to_string();
    let provider = provider.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM user_providers WHERE user_id = ?1 AND provider = ?2"
            ))?;
            let result = stmt.query_row(params![user_id, provider], provider_from_row);
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create or reactivate a provider row.
///
/// Returns the stored row and whether it was newly created. On reactivation a
/// `None` credential keeps the stored one; `Some` replaces it.
pub async fn upsert(
    db: &Database,
    user_id: &str,
    provider: &str,
    credential: Option<String>,
) -> Result<(ConnectedProvider, bool), ModelmuxError> {
    let user_id = user_id.to_string();
    let provider = provider.to_string();
    let new_id = uuid::Uuid::new_v4().to_string();
    let now = now_iso8601();
    db.connection()
        .call(move |conn| -> Result<(ConnectedProvider, bool), rusqlite::Error> {
            let existing: Option<String> = {
                let mut stmt = conn.prepare(
                    "SELECT id FROM user_providers WHERE user_id = ?1 AND provider = ?2",
                )?;
                match stmt.query_row(params![user_id, provider], |row| row.get(0)) {
                    Ok(id) => Some(id),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e),
                }
            };

            let created = existing.is_none();
            match existing {
                Some(id) => {
                    conn.execute(
                        "UPDATE user_providers
                         SET is_active = 1,
                             credential = CASE WHEN ?2 IS NULL THEN credential ELSE ?2 END
                         WHERE id = ?1",
                        params![id, credential],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO user_providers
                             (id, user_id, provider, credential, is_active, connected_at)
                         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                        params![new_id, user_id, provider, credential, now],
                    )?;
                }
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM user_providers WHERE user_id = ?1 AND provider = ?2"
            ))?;
            let row = stmt.query_row(params![user_id, provider], provider_from_row)?;
            Ok((row, created))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deactivate one provider. Returns false when no row matched.
pub async fn deactivate(
    db: &Database,
    user_id: &str,
    provider: &str,
) -> Result<bool, ModelmuxError> {
    let user_id = user_id.to_string();
    let provider = provider.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE user_providers SET is_active = 0 WHERE user_id = ?1 AND provider = ?2",
                params![user_id, provider],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deactivate every provider for a user. Returns how many rows changed.
pub async fn deactivate_all(db: &Database, user_id: &str) -> Result<usize, ModelmuxError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE user_providers SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
                params![user_id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
