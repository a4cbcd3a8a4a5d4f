// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier assignment operations.
//!
//! Every write here is an upsert keyed on `(user_id, tier)`, so recalculation
//! is idempotent and safe to retry after a crash.

use modelmux_core::types::now_iso8601;
use modelmux_core::{ModelmuxError, Tier, TierAssignment};
use rusqlite::params;

use crate::database::Database;

fn assignment_from_row(row: &rusqlite::Row<'_>) -> Result<TierAssignment, rusqlite::Error> {
    let tier: String = row.get(1)?;
    let tier = tier.parse::<Tier>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(TierAssignment {
        user_id: row.get(0)?,
        tier,
        override_model: row.get(2)?,
        auto_assigned_model: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// The user's assignment rows in tier order (simple first).
pub async fn get_for_user(
    db: &Database,
    user_id: &str,
) -> Result<Vec<TierAssignment>, ModelmuxError> {
    let user_id = user_id.to_string();
    let mut rows = db
        .connection()
        .call(move |conn| -> Result<Vec<TierAssignment>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT user_id, tier, override_model, auto_assigned_model, updated_at
                 FROM tier_assignments WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map(params![user_id], assignment_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    rows.sort_by_key(|a| Tier::ALL.iter().position(|t| *t == a.tier));
    Ok(rows)
}

/// Create the four tier rows if absent. Returns true when any row was created.
pub async fn ensure_rows(db: &Database, user_id: &str) -> Result<bool, ModelmuxError> {
    let user_id = user_id.to_string();
    let now = now_iso8601();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO tier_assignments (user_id, tier, updated_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            let mut created = 0;
            for tier in Tier::ALL {
                created += stmt.execute(params![user_id, tier.to_string(), now])?;
            }
            Ok(created > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert one tier's auto-assigned model, leaving any override untouched.
pub async fn set_auto_model(
    db: &Database,
    user_id: &str,
    tier: Tier,
    model: Option<String>,
) -> Result<(), ModelmuxError> {
    let user_id = user_id.to_string();
    let now = now_iso8601();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tier_assignments (user_id, tier, auto_assigned_model, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, tier) DO UPDATE SET
                     auto_assigned_model = excluded.auto_assigned_model,
                     updated_at = excluded.updated_at",
                params![user_id, tier.to_string(), model, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert one tier's override, leaving the auto assignment untouched.
pub async fn set_override_model(
    db: &Database,
    user_id: &str,
    tier: Tier,
    model: Option<String>,
) -> Result<(), ModelmuxError> {
    let user_id = user_id.to_string();
    let now = now_iso8601();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tier_assignments (user_id, tier, override_model, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, tier) DO UPDATE SET
                     override_model = excluded.override_model,
                     updated_at = excluded.updated_at",
                params![user_id, tier.to_string(), model, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Clear every override for a user. Returns how many rows actually changed.
pub async fn clear_all_overrides(db: &Database, user_id: &str) -> Result<usize, ModelmuxError> {
    let user_id = user_id.to_string();
    let now = now_iso8601();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE tier_assignments SET override_model = NULL, updated_at = ?2
                 WHERE user_id = ?1 AND override_model IS NOT NULL",
                params![user_id, now],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All assignment rows (across users) whose override references one of the
/// given model names. Used when catalog sync drops models.
pub async fn overrides_referencing(
    db: &Database,
    models: &[String],
) -> Result<Vec<TierAssignment>, ModelmuxError> {
    let models = models.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<TierAssignment>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT user_id, tier, override_model, auto_assigned_model, updated_at
                 FROM tier_assignments WHERE override_model = ?1",
            )?;
            let mut hits = Vec::new();
            for model in &models {
                let rows = stmt.query_map(params![model], assignment_from_row)?;
                for row in rows {
                    hits.push(row?);
                }
            }
            Ok(hits)
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
    async fn ensure_rows_creates_four_then_noops() {
        let db = test_db().await;

        assert!(ensure_rows(&db, "u1").await.unwrap());
        let rows = get_for_user(&db, "u1").await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|r| r.tier).collect::<Vec<_>>(),
            Tier::ALL.to_vec()
        );
        assert!(rows.iter().all(|r| r.override_model.is_none()));
        assert!(rows.iter().all(|r| r.auto_assigned_model.is_none()));

        assert!(!ensure_rows(&db, "u1").await.unwrap());
    }

    #[tokio::test]
    async fn auto_and_override_writes_are_independent() {
        let db = test_db().await;
        ensure_rows(&db, "u1").await.unwrap();

        set_override_model(&db, "u1", Tier::Complex, Some("gpt-4.1".into()))
            .await
            .unwrap();
        set_auto_model(&db, "u1", Tier::Complex, Some("claude-sonnet-4-5".into()))
            .await
            .unwrap();

        let rows = get_for_user(&db, "u1").await.unwrap();
        let complex = rows.iter().find(|r| r.tier == Tier::Complex).unwrap();
        assert_eq!(complex.override_model.as_deref(), Some("gpt-4.1"));
        assert_eq!(
            complex.auto_assigned_model.as_deref(),
            Some("claude-sonnet-4-5")
        );
    }

    #[tokio::test]
    async fn set_auto_model_upserts_missing_row() {
        let db = test_db().await;
        // No ensure_rows call: the upsert itself must create the row.
        set_auto_model(&db, "u1", Tier::Simple, Some("gpt-4.1-nano".into()))
            .await
            .unwrap();

        let rows = get_for_user(&db, "u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].auto_assigned_model.as_deref(), Some("gpt-4.1-nano"));
    }

    #[tokio::test]
    async fn clear_all_overrides_counts_changes() {
        let db = test_db().await;
        ensure_rows(&db, "u1").await.unwrap();
        set_override_model(&db, "u1", Tier::Simple, Some("a".into()))
            .await
            .unwrap();
        set_override_model(&db, "u1", Tier::Reasoning, Some("b".into()))
            .await
            .unwrap();

        assert_eq!(clear_all_overrides(&db, "u1").await.unwrap(), 2);
        assert_eq!(clear_all_overrides(&db, "u1").await.unwrap(), 0);

        let rows = get_for_user(&db, "u1").await.unwrap();
        assert!(rows.iter().all(|r| r.override_model.is_none()));
    }

    #[tokio::test]
    async fn overrides_referencing_finds_rows_across_users() {
        let db = test_db().await;
        set_override_model(&db, "u1", Tier::Complex, Some("doomed".into()))
            .await
            .unwrap();
        set_override_model(&db, "u2", Tier::Simple, Some("doomed".into()))
            .await
            .unwrap();
        set_override_model(&db, "u2", Tier::Standard, Some("kept".into()))
            .await
            .unwrap();

        let hits = overrides_referencing(&db, &["doomed".to_string()]).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|h| h.user_id == "u1" && h.tier == Tier::Complex));
        assert!(hits.iter().any(|h| h.user_id == "u2" && h.tier == Tier::Simple));
    }
}
