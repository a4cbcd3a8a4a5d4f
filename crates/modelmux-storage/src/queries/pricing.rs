// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing catalog operations.

use modelmux_core::ModelmuxError;
use rusqlite::params;

use crate::database::Database;
use crate::models::CatalogEntry;

fn entry_from_row(row: &rusqlite::Row<'_>) -> Result<CatalogEntry, rusqlite::Error> {
    Ok(CatalogEntry {
        model_name: row.get(0)?,
        provider: row.get(1)?,
        input_price_per_token: row.get(2)?,
        output_price_per_token: row.get(3)?,
        context_window: row.get(4)?,
        capability_reasoning: row.get(5)?,
        capability_code: row.get(6)?,
        quality_score: row.get(7)?,
    })
}

/// Load the full catalog in insertion order.
///
/// Insertion order is the catalog order downstream tie-breaks depend on, so
/// the rowid sort here is load-bearing.
pub async fn get_all(db: &Database) -> Result<Vec<CatalogEntry>, ModelmuxError> {
    db.connection()
        .call(|conn| -> Result<Vec<CatalogEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT model_name, provider, input_price_per_token, output_price_per_token,
                        context_window, capability_reasoning, capability_code, quality_score
                 FROM model_pricing ORDER BY rowid",
            )?;
            let rows = stmt.query_map([], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create or update a catalog row, keyed by model name.
pub async fn upsert(db: &Database, entry: &CatalogEntry) -> Result<(), ModelmuxError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO model_pricing
                     (model_name, provider, input_price_per_token, output_price_per_token,
                      context_window, capability_reasoning, capability_code, quality_score,
                      updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(model_name) DO UPDATE SET
                     provider = excluded.provider,
                     input_price_per_token = excluded.input_price_per_token,
                     output_price_per_token = excluded.output_price_per_token,
                     context_window = excluded.context_window,
                     capability_reasoning = excluded.capability_reasoning,
                     capability_code = excluded.capability_code,
                     quality_score = excluded.quality_score,
                     updated_at = excluded.updated_at",
                params![
                    entry.model_name,
                    entry.provider,
                    entry.input_price_per_token,
                    entry.output_price_per_token,
                    entry.context_window,
                    entry.capability_reasoning,
                    entry.capability_code,
                    entry.quality_score,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Write a corrected quality score for one model.
pub async fn update_quality_score(
    db: &Database,
    model_name: &str,
    score: u8,
) -> Result<(), ModelmuxError> {
    let model_name = model_name.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE model_pricing
                 SET quality_score = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE model_name = ?1",
                params![model_name, score],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Model names currently cataloged under one provider (case-insensitive).
pub async fn model_names_for_provider(
    db: &Database,
    provider: &str,
) -> Result<Vec<String>, ModelmuxError> {
    let provider = provider.to_lowercase();
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT model_name FROM model_pricing WHERE LOWER(provider) = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![provider], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete catalog rows by model name. Returns the number deleted.
pub async fn delete_by_names(db: &Database, names: &[String]) -> Result<usize, ModelmuxError> {
    let names = names.to_vec();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let mut stmt = conn.prepare("DELETE FROM model_pricing WHERE model_name = ?1")?;
            let mut deleted = 0;
            for name in &names {
                deleted += stmt.execute(params![name])?;
            }
            Ok(deleted)
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

    fn sample_entry(name: &str, provider: &str) -> CatalogEntry {
        CatalogEntry {
            model_name: name.to_string(),
            provider: provider.to_string(),
            input_price_per_token: 0.000001,
            output_price_per_token: 0.000002,
            context_window: 128_000,
            capability_reasoning: true,
            capability_code: false,
            quality_score: 4,
        }
    }

    #[tokio::test]
    async fn seed_catalog_is_present() {
        let db = test_db().await;
        let all = get_all(&db).await.unwrap();
        assert!(all.len() >= 14);
        assert!(all.iter().any(|e| e.model_name == "gpt-4.1"));
        assert!(all.iter().any(|e| e.model_name == "claude-sonnet-4-5"));
    }

    #[tokio::test]
    async fn get_all_preserves_insertion_order() {
        let db = test_db().await;
        upsert(&db, &sample_entry("zzz-first", "ollama")).await.unwrap();
        upsert(&db, &sample_entry("aaa-second", "ollama")).await.unwrap();

        let all = get_all(&db).await.unwrap();
        let zzz = all.iter().position(|e| e.model_name == "zzz-first").unwrap();
        let aaa = all.iter().position(|e| e.model_name == "aaa-second").unwrap();
        assert!(zzz < aaa, "rowid order must win over lexical order");
    }

    #[tokio::test]
    async fn upsert_updates_existing_row_in_place() {
        let db = test_db().await;
        let mut entry = sample_entry("test-model", "ollama");
        upsert(&db, &entry).await.unwrap();

        entry.quality_score = 2;
        entry.context_window = 32_768;
        upsert(&db, &entry).await.unwrap();

        let all = get_all(&db).await.unwrap();
        let stored: Vec<_> = all.iter().filter(|e| e.model_name == "test-model").collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quality_score, 2);
        assert_eq!(stored[0].context_window, 32_768);
    }

    #[tokio::test]
    async fn update_quality_score_touches_one_row() {
        let db = test_db().await;
        upsert(&db, &sample_entry("scored", "ollama")).await.unwrap();
        update_quality_score(&db, "scored", 1).await.unwrap();

        let all = get_all(&db).await.unwrap();
        let entry = all.iter().find(|e| e.model_name == "scored").unwrap();
        assert_eq!(entry.quality_score, 1);
        // Seed rows are untouched.
        let gpt = all.iter().find(|e| e.model_name == "gpt-4.1").unwrap();
        assert_eq!(gpt.quality_score, 5);
    }

    #[tokio::test]
    async fn provider_listing_and_deletion() {
        let db = test_db().await;
        upsert(&db, &sample_entry("local-a", "ollama")).await.unwrap();
        upsert(&db, &sample_entry("local-b", "Ollama")).await.unwrap();

        let names = model_names_for_provider(&db, "OLLAMA").await.unwrap();
        assert_eq!(names, vec!["local-a".to_string(), "local-b".to_string()]);

        let deleted = delete_by_names(&db, &names).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(
            model_names_for_provider(&db, "ollama")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
