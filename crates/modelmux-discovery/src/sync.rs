// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog synchronization from a discovery source.
//!
//! Folds the source's current model list into the pricing catalog as
//! zero-price entries, drops rows for models the source no longer
//! serves, reloads the cache, and invalidates overrides stranded by
//! the removals. A failed fetch changes nothing and reports zero
//! models rather than propagating the failure.

use std::collections::HashSet;
use std::sync::Arc;

use modelmux_catalog::{quality_score, PricingCache};
use modelmux_core::{CatalogEntry, ModelmuxError};
use modelmux_routing::AssignmentService;
use modelmux_storage::queries::pricing;
use modelmux_storage::Database;
use tracing::{info, warn};

use crate::client::{CatalogSource, DiscoveredModel};

/// Name fragments that mark a local model as reasoning-capable.
const REASONING_KEYWORDS: &[&str] = &["r1", "qwq", "think", "reason", "o1"];

/// Name fragments that mark a local model as code-capable.
const CODE_KEYWORDS: &[&str] = &["code", "coder", "codestral", "starcoder"];

/// Context-window defaults by model family, with a conservative
/// fallback for unknown families.
const FAMILY_CONTEXT_WINDOWS: &[(&str, u32)] = &[
    ("llama", 131_072),
    ("qwen", 32_768),
    ("mistral", 32_768),
    ("deepseek", 64_000),
    ("phi", 16_384),
    ("gemma", 8_192),
];

const DEFAULT_CONTEXT_WINDOW: u32 = 8_192;

/// Outcome of one catalog sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Models the source reported this run.
    pub count: usize,
    /// Catalog rows dropped because the source no longer serves them.
    pub removed: usize,
}

/// Synchronizes the pricing catalog with one discovery source.
pub struct CatalogSync {
    db: Arc<Database>,
    cache: Arc<PricingCache>,
    assignments: Arc<AssignmentService>,
    source: Box<dyn CatalogSource>,
}

impl CatalogSync {
    pub fn new(
        db: Arc<Database>,
        cache: Arc<PricingCache>,
        assignments: Arc<AssignmentService>,
        source: Box<dyn CatalogSource>,
    ) -> Self {
        Self {
            db,
            cache,
            assignments,
            source,
        }
    }

    /// Runs one full sync cycle.
    ///
    /// On a fetch failure the catalog is left untouched; removal is
    /// only inferred from a successful listing, so a transient outage
    /// never tears down previously discovered rows.
    pub async fn run(&self) -> Result<SyncOutcome, ModelmuxError> {
        let discovered = match self.source.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "catalog discovery failed, treating as zero models");
                metrics::counter!("modelmux_discovery_failures_total").increment(1);
                return Ok(SyncOutcome {
                    count: 0,
                    removed: 0,
                });
            }
        };

        let provider = self.source.provider_name().to_string();
        let previous = pricing::model_names_for_provider(&self.db, &provider).await?;

        let mut current = HashSet::with_capacity(discovered.len());
        for model in &discovered {
            let entry = entry_from_discovered(&provider, model);
            pricing::upsert(&self.db, &entry).await?;
            current.insert(entry.model_name);
        }

        let removed: Vec<String> = previous
            .into_iter()
            .filter(|name| !current.contains(name))
            .collect();
        if !removed.is_empty() {
            pricing::delete_by_names(&self.db, &removed).await?;
        }

        // Reload before invalidation so the recalculations triggered by
        // stranded overrides see the post-sync catalog.
        self.cache.reload().await?;
        if !removed.is_empty() {
            self.assignments
                .invalidate_overrides_for_removed_models(&removed)
                .await?;
        }

        metrics::counter!("modelmux_catalog_syncs_total").increment(1);
        info!(
            provider = %provider,
            count = current.len(),
            removed = removed.len(),
            "catalog sync complete"
        );
        Ok(SyncOutcome {
            count: current.len(),
            removed: removed.len(),
        })
    }
}

/// Builds a zero-price catalog entry for a discovered model, with
/// capabilities inferred from its name and the context window from its
/// family. The stored score is computed up front so the next cache
/// reload has nothing to correct.
fn entry_from_discovered(provider: &str, model: &DiscoveredModel) -> CatalogEntry {
    let name_lower = model.name.to_lowercase();
    let family = model
        .details
        .as_ref()
        .and_then(|d| d.family.as_deref())
        .map(str::to_lowercase);

    let reasoning = REASONING_KEYWORDS.iter().any(|k| name_lower.contains(k));
    let code = CODE_KEYWORDS.iter().any(|k| name_lower.contains(k));

    let mut entry = CatalogEntry {
        model_name: model.name.clone(),
        provider: provider.to_string(),
        input_price_per_token: 0.0,
        output_price_per_token: 0.0,
        context_window: context_window_for(family.as_deref(), &name_lower),
        capability_reasoning: reasoning,
        capability_code: code,
        quality_score: 1,
    };
    entry.quality_score = quality_score(&entry);
    entry
}

fn context_window_for(family: Option<&str>, name_lower: &str) -> u32 {
    for (fragment, window) in FAMILY_CONTEXT_WINDOWS {
        let family_hit = family.is_some_and(|f| f.contains(fragment));
        if family_hit || name_lower.contains(fragment) {
            return *window;
        }
    }
    DEFAULT_CONTEXT_WINDOW
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelmux_core::Tier;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::OllamaClient;

    struct Harness {
        sync: CatalogSync,
        cache: Arc<PricingCache>,
        assignments: Arc<AssignmentService>,
        server: MockServer,
    }

    async fn harness() -> Harness {
        let server = MockServer::start().await;
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let cache = Arc::new(PricingCache::new(Arc::clone(&db)));
        cache.reload().await.unwrap();
        let assignments = Arc::new(AssignmentService::new(Arc::clone(&db), Arc::clone(&cache)));
        let sync = CatalogSync::new(
            db,
            Arc::clone(&cache),
            Arc::clone(&assignments),
            Box::new(OllamaClient::new(server.uri()).unwrap()),
        );
        Harness {
            sync,
            cache,
            assignments,
            server,
        }
    }

    async fn mount_tags(server: &MockServer, body: serde_json::Value) {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sync_ingests_discovered_models_as_zero_price() {
        let h = harness().await;
        mount_tags(
            &h.server,
            serde_json::json!({"models": [
                {"name": "llama3:8b", "details": {"family": "llama", "parameter_size": "8B"}},
                {"name": "deepseek-r1:7b", "details": {"family": "qwen2", "parameter_size": "7B"}}
            ]}),
        )
        .await;

        let outcome = h.sync.run().await.unwrap();
        assert_eq!(outcome, SyncOutcome { count: 2, removed: 0 });

        let llama = h.cache.get_by_model("llama3:8b").unwrap();
        assert_eq!(llama.provider, "ollama");
        assert_eq!(llama.total_price_per_million(), 0.0);
        assert_eq!(llama.context_window, 131_072);
        assert!(!llama.capability_reasoning);

        let r1 = h.cache.get_by_model("deepseek-r1:7b").unwrap();
        assert!(r1.capability_reasoning);
        assert_eq!(r1.context_window, 32_768, "qwen2 family sets the window");
        assert_eq!(r1.quality_score, 3, "free non-mini reasoner");
    }

    #[tokio::test]
    async fn resync_drops_stale_models_and_clears_stranded_overrides() {
        let h = harness().await;
        mount_tags(
            &h.server,
            serde_json::json!({"models": [{"name": "llama3:8b"}, {"name": "qwq:32b"}]}),
        )
        .await;
        h.sync.run().await.unwrap();

        h.assignments.upsert_provider("u1", "ollama", None).await.unwrap();
        h.assignments
            .set_override("u1", Tier::Reasoning, "qwq:32b")
            .await
            .unwrap();

        // The reasoner disappears from the local server.
        mount_tags(&h.server, serde_json::json!({"models": [{"name": "llama3:8b"}]})).await;
        let outcome = h.sync.run().await.unwrap();
        assert_eq!(outcome, SyncOutcome { count: 1, removed: 1 });

        assert!(h.cache.get_by_model("qwq:32b").is_none());
        let rows = h.assignments.get_tiers("u1").await.unwrap();
        let reasoning = rows.iter().find(|r| r.tier == Tier::Reasoning).unwrap();
        assert_eq!(reasoning.override_model, None);
        assert_eq!(
            reasoning.auto_assigned_model.as_deref(),
            Some("llama3:8b"),
            "recalculated over the surviving model"
        );
    }

    #[tokio::test]
    async fn failed_fetch_reports_zero_and_keeps_catalog() {
        let h = harness().await;
        mount_tags(&h.server, serde_json::json!({"models": [{"name": "llama3:8b"}]})).await;
        h.sync.run().await.unwrap();

        h.server.reset().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&h.server)
            .await;

        let outcome = h.sync.run().await.unwrap();
        assert_eq!(outcome, SyncOutcome { count: 0, removed: 0 });
        // Previously discovered rows survive the outage.
        assert!(h.cache.get_by_model("llama3:8b").is_some());
    }

    #[test]
    fn capability_and_context_inference() {
        let coder = entry_from_discovered(
            "ollama",
            &DiscoveredModel {
                name: "qwen2.5-coder:7b".to_string(),
                details: None,
            },
        );
        assert!(coder.capability_code);
        assert!(!coder.capability_reasoning);
        assert_eq!(coder.context_window, 32_768, "qwen fragment in the name");
        assert_eq!(coder.quality_score, 2, "free code-only model");

        let unknown = entry_from_discovered(
            "ollama",
            &DiscoveredModel {
                name: "tinymodel:1b".to_string(),
                details: None,
            },
        );
        assert_eq!(unknown.context_window, DEFAULT_CONTEXT_WINDOW);
        assert_eq!(unknown.quality_score, 1);
    }
}
