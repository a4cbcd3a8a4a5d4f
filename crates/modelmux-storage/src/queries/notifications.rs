// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification operations.

use modelmux_core::types::now_iso8601;
use modelmux_core::{ModelmuxError, Notification};
use rusqlite::params;

use crate::database::Database;

/// Record a notification for a user and return the stored row.
pub async fn insert(
    db: &Database,
    user_id: &str,
    message: &str,
) -> Result<Notification, ModelmuxError> {
    let notification = Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        message: message.to_string(),
        created_at: now_iso8601(),
    };
    let row = notification.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO notifications (id, user_id, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.id, row.user_id, row.message, row.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(notification)
}

/// Most recent notifications for a user, newest first.
pub async fn list_recent(
    db: &Database,
    user_id: &str,
    limit: u32,
) -> Result<Vec<Notification>, ModelmuxError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Notification>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, created_at FROM notifications
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| {
                Ok(Notification {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_list_newest_first() {
        let db = test_db().await;
        insert(&db, "u1", "first").await.unwrap();
        insert(&db, "u1", "second").await.unwrap();
        insert(&db, "u2", "other user").await.unwrap();

        let rows = list_recent(&db, "u1", 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, "second");
        assert_eq!(rows[1].message, "first");
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let db = test_db().await;
        for i in 0..5 {
            insert(&db, "u1", &format!("note {i}")).await.unwrap();
        }
        assert_eq!(list_recent(&db, "u1", 3).await.unwrap().len(), 3);
    }
}
