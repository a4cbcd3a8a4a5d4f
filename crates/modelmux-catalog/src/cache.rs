// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory mirror of the model catalog.
//!
//! The cache holds an immutable snapshot behind an atomic pointer.
//! `reload` builds a fresh snapshot off to the side and swaps it in;
//! concurrent lookups see either the old or the new catalog, never a
//! half-rebuilt one. Stale persisted quality scores are corrected
//! against the scorer before the swap so lookups never return a score
//! the scorer disagrees with.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use modelmux_core::{CatalogEntry, ModelmuxError};
use modelmux_storage::{queries::pricing, Database};
use tracing::{debug, info};

use crate::{alias, score};

/// One immutable view of the catalog. `ordered` preserves catalog
/// insertion order, which downstream selection relies on for
/// deterministic tie-breaking.
#[derive(Default)]
struct CatalogSnapshot {
    ordered: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
    names: HashSet<String>,
}

impl CatalogSnapshot {
    fn build(entries: Vec<CatalogEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        let mut names = HashSet::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            index.insert(entry.model_name.clone(), position);
            names.insert(entry.model_name.clone());
        }
        CatalogSnapshot {
            ordered: entries,
            index,
            names,
        }
    }
}

/// Outcome of one [`PricingCache::reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadStats {
    /// Entries in the new snapshot.
    pub entries: usize,
    /// Stale scores corrected and written back during this reload.
    pub corrections: usize,
}

/// Shared, reload-on-demand catalog cache.
///
/// Cheap to clone the `Arc` around; all interior state is designed for
/// concurrent readers with an occasional reloading writer.
pub struct PricingCache {
    db: Arc<Database>,
    snapshot: ArcSwap<CatalogSnapshot>,
    unresolved: DashMap<String, u64>,
}

impl PricingCache {
    /// Creates an empty cache. Call [`reload`] before serving lookups.
    ///
    /// [`reload`]: PricingCache::reload
    pub fn new(db: Arc<Database>) -> Self {
        PricingCache {
            db,
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::default()),
            unresolved: DashMap::new(),
        }
    }

    /// Rebuilds the snapshot from persistence and swaps it in.
    ///
    /// Any entry whose stored score disagrees with the scorer gets a
    /// correction written back before the swap, so the snapshot and the
    /// store converge on the same scores. Safe to call concurrently;
    /// each call swaps in a complete snapshot.
    pub async fn reload(&self) -> Result<ReloadStats, ModelmuxError> {
        let mut entries = pricing::get_all(&self.db).await?;

        let mut corrections = 0;
        for entry in &mut entries {
            let expected = score::quality_score(entry);
            if entry.quality_score != expected {
                pricing::update_quality_score(&self.db, &entry.model_name, expected).await?;
                debug!(
                    model = %entry.model_name,
                    stored = entry.quality_score,
                    corrected = expected,
                    "corrected stale quality score"
                );
                entry.quality_score = expected;
                corrections += 1;
            }
        }

        let stats = ReloadStats {
            entries: entries.len(),
            corrections,
        };
        self.snapshot.store(Arc::new(CatalogSnapshot::build(entries)));

        metrics::counter!("modelmux_catalog_reloads_total").increment(1);
        metrics::gauge!("modelmux_catalog_models").set(stats.entries as f64);
        if corrections > 0 {
            metrics::counter!("modelmux_score_corrections_total").increment(corrections as u64);
        }
        info!(
            entries = stats.entries,
            corrections = stats.corrections,
            "pricing cache reloaded"
        );
        Ok(stats)
    }

    /// Looks up a model by name: exact match first, then alias
    /// resolution against the current key set. A double miss is tallied
    /// for observability and returns `None`; it never fails the caller.
    pub fn get_by_model(&self, name: &str) -> Option<CatalogEntry> {
        let snapshot = self.snapshot.load();
        if let Some(position) = snapshot.index.get(name) {
            return Some(snapshot.ordered[*position].clone());
        }
        if let Some(resolved) = alias::resolve_model_name(name, &snapshot.names) {
            if let Some(position) = snapshot.index.get(&resolved) {
                return Some(snapshot.ordered[*position].clone());
            }
        }
        self.record_unresolved(name);
        None
    }

    /// All entries in catalog order, as a defensive copy.
    pub fn get_all(&self) -> Vec<CatalogEntry> {
        self.snapshot.load().ordered.clone()
    }

    /// Model names the current snapshot knows.
    pub fn known_names(&self) -> HashSet<String> {
        self.snapshot.load().names.clone()
    }

    /// Lookup names that resolved to nothing, with miss counts,
    /// highest first. Cleared only by process restart.
    pub fn unresolved_lookups(&self) -> Vec<(String, u64)> {
        let mut tally: Vec<(String, u64)> = self
            .unresolved
            .iter()
            .map(|kv| (kv.key().clone(), *kv.value()))
            .collect();
        tally.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tally
    }

    fn record_unresolved(&self, name: &str) {
        *self.unresolved.entry(name.to_string()).or_insert(0) += 1;
        metrics::counter!("modelmux_unresolved_lookups_total").increment(1);
        debug!(model = name, "model lookup unresolved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_cache() -> PricingCache {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let cache = PricingCache::new(db);
        cache.reload().await.unwrap();
        cache
    }

    fn local_entry(name: &str) -> CatalogEntry {
        CatalogEntry {
            model_name: name.to_string(),
            provider: "ollama".to_string(),
            input_price_per_token: 0.0,
            output_price_per_token: 0.0,
            context_window: 32_768,
            capability_reasoning: true,
            capability_code: true,
            quality_score: 3,
        }
    }

    #[tokio::test]
    async fn reload_mirrors_seed_catalog_without_corrections() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let cache = PricingCache::new(Arc::clone(&db));

        let stats = cache.reload().await.unwrap();
        assert!(stats.entries >= 14);
        // Seeded scores already agree with the scorer.
        assert_eq!(stats.corrections, 0);

        let again = cache.reload().await.unwrap();
        assert_eq!(again.entries, stats.entries);
        assert_eq!(again.corrections, 0);
    }

    #[tokio::test]
    async fn reload_corrects_stale_scores_once() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let mut entry = local_entry("qwen3-local");
        entry.quality_score = 1; // disagrees with the scorer's 3
        pricing::upsert(&db, &entry).await.unwrap();

        let cache = PricingCache::new(Arc::clone(&db));
        let first = cache.reload().await.unwrap();
        assert_eq!(first.corrections, 1);
        assert_eq!(cache.get_by_model("qwen3-local").unwrap().quality_score, 3);

        // The write-back persisted, so a second reload is clean and
        // leaves the catalog unchanged.
        let before = cache.get_all();
        let second = cache.reload().await.unwrap();
        assert_eq!(second.corrections, 0);
        assert_eq!(cache.get_all(), before);
    }

    #[tokio::test]
    async fn exact_lookup_wins_over_alias() {
        let cache = seeded_cache().await;
        let entry = cache.get_by_model("gpt-4.1").unwrap();
        assert_eq!(entry.model_name, "gpt-4.1");
        assert_eq!(entry.provider, "openai");
    }

    #[tokio::test]
    async fn alias_lookup_resolves_prefixed_dated_name() {
        let cache = seeded_cache().await;
        let entry = cache.get_by_model("openai/gpt-4.1-2025-04-14").unwrap();
        assert_eq!(entry.model_name, "gpt-4.1");
    }

    #[tokio::test]
    async fn rebrand_lookup_resolves() {
        let cache = seeded_cache().await;
        let entry = cache.get_by_model("deepseek-chat").unwrap();
        assert_eq!(entry.model_name, "deepseek-v3");
    }

    #[tokio::test]
    async fn double_miss_is_tallied_not_failed() {
        let cache = seeded_cache().await;
        assert!(cache.get_by_model("llama-99-instruct").is_none());
        assert!(cache.get_by_model("llama-99-instruct").is_none());
        assert!(cache.get_by_model("mystery-model").is_none());

        let tally = cache.unresolved_lookups();
        assert_eq!(
            tally,
            vec![
                ("llama-99-instruct".to_string(), 2),
                ("mystery-model".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn get_all_is_a_defensive_copy_in_catalog_order() {
        let cache = seeded_cache().await;
        let mut copy = cache.get_all();
        let original_first = copy[0].clone();
        copy[0].model_name = "tampered".to_string();
        copy.reverse();

        let fresh = cache.get_all();
        assert_eq!(fresh[0], original_first);
        // Catalog order is the seed insertion order, not lexical.
        assert_eq!(fresh[0].model_name, "gpt-4.1");
    }

    #[tokio::test]
    async fn empty_cache_resolves_nothing() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let cache = PricingCache::new(db);
        // No reload yet: every lookup misses but nothing panics.
        assert!(cache.get_by_model("gpt-4.1").is_none());
        assert!(cache.get_all().is_empty());
    }
}
