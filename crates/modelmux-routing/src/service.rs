// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment orchestration.
//!
//! [`AssignmentService`] owns the per-user tier assignment records and
//! the connected-provider rows, and is the only writer for both. It
//! re-runs selection whenever providers or the catalog change, and
//! resolves the effective model for reads with the override fallback
//! rule: an override only wins while its provider is still reachable
//! and the model still resolves in the cache.

use std::collections::HashSet;
use std::sync::Arc;

use modelmux_catalog::{alias, PricingCache};
use modelmux_core::{
    CatalogEntry, ConnectedProvider, ModelmuxError, Notification, Tier, TierAssignment,
};
use modelmux_storage::queries::{assignments, notifications, providers};
use modelmux_storage::Database;
use tracing::{debug, info};

use crate::selector;

/// The model a caller should actually use for a tier.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveModel {
    pub model: String,
    /// Provider as stored in the catalog, when the model resolves.
    pub provider: Option<String>,
}

/// Owns tier assignments and provider connectivity for all users.
pub struct AssignmentService {
    db: Arc<Database>,
    cache: Arc<PricingCache>,
}

impl AssignmentService {
    pub fn new(db: Arc<Database>, cache: Arc<PricingCache>) -> Self {
        Self { db, cache }
    }

    pub fn cache(&self) -> &Arc<PricingCache> {
        &self.cache
    }

    /// The user's active provider names, lowercased and alias-expanded.
    async fn reachable_providers(&self, user_id: &str) -> Result<HashSet<String>, ModelmuxError> {
        let active = providers::list_active(&self.db, user_id).await?;
        Ok(alias::expand_provider_names(
            active.iter().map(|p| p.provider.as_str()),
        ))
    }

    /// Catalog entries whose provider is reachable for the user.
    fn candidates(&self, reachable: &HashSet<String>) -> Vec<CatalogEntry> {
        self.cache
            .get_all()
            .into_iter()
            .filter(|e| reachable.contains(&e.provider.to_lowercase()))
            .collect()
    }

    /// Recomputes every tier's auto-assigned model from the current
    /// providers and catalog. Overrides are left untouched; each tier
    /// write is an idempotent upsert, so a crash mid-way leaves prior
    /// assignments valid until the next trigger.
    pub async fn recalculate(&self, user_id: &str) -> Result<(), ModelmuxError> {
        let reachable = self.reachable_providers(user_id).await?;
        let candidates = self.candidates(&reachable);
        for tier in Tier::ALL {
            let pick = selector::pick_best(&candidates, tier);
            debug!(
                user_id,
                tier = %tier,
                model = pick.as_ref().map(|p| p.model_name.as_str()).unwrap_or("none"),
                "auto assignment"
            );
            assignments::set_auto_model(&self.db, user_id, tier, pick.map(|p| p.model_name))
                .await?;
        }
        metrics::counter!("modelmux_recalculations_total").increment(1);
        Ok(())
    }

    /// The user's four assignment rows, created lazily on first access.
    ///
    /// When the rows were just created and the user already has an
    /// active provider, one recalculation runs before returning so a
    /// first-time caller never sees stale nulls.
    pub async fn get_tiers(&self, user_id: &str) -> Result<Vec<TierAssignment>, ModelmuxError> {
        let created = assignments::ensure_rows(&self.db, user_id).await?;
        if created {
            let active = providers::list_active(&self.db, user_id).await?;
            if !active.is_empty() {
                self.recalculate(user_id).await?;
            }
        }
        assignments::get_for_user(&self.db, user_id).await
    }

    /// Pins a model to a tier. Stored as given; whether the pin
    /// actually serves is decided at read time by the fallback rule.
    pub async fn set_override(
        &self,
        user_id: &str,
        tier: Tier,
        model: &str,
    ) -> Result<(), ModelmuxError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ModelmuxError::InvalidRequest(
                "model must not be empty".to_string(),
            ));
        }
        assignments::ensure_rows(&self.db, user_id).await?;
        assignments::set_override_model(&self.db, user_id, tier, Some(model.to_string())).await
    }

    pub async fn clear_override(&self, user_id: &str, tier: Tier) -> Result<(), ModelmuxError> {
        assignments::ensure_rows(&self.db, user_id).await?;
        assignments::set_override_model(&self.db, user_id, tier, None).await
    }

    /// Clears every override and recomputes the auto assignments.
    /// Returns how many overrides were cleared.
    pub async fn reset_all(&self, user_id: &str) -> Result<usize, ModelmuxError> {
        let cleared = assignments::clear_all_overrides(&self.db, user_id).await?;
        self.recalculate(user_id).await?;
        Ok(cleared)
    }

    /// Connects or reactivates a provider, then recalculates.
    ///
    /// The connected event (log, counter, notification) fires only when
    /// the row is newly created, not on reactivation.
    pub async fn upsert_provider(
        &self,
        user_id: &str,
        provider: &str,
        credential: Option<String>,
    ) -> Result<(ConnectedProvider, bool), ModelmuxError> {
        let provider = provider.trim().to_lowercase();
        if provider.is_empty() {
            return Err(ModelmuxError::InvalidRequest(
                "provider name must not be empty".to_string(),
            ));
        }

        let (row, created) = providers::upsert(&self.db, user_id, &provider, credential).await?;
        if created {
            info!(user_id, provider = %provider, "provider connected");
            metrics::counter!("modelmux_providers_connected_total").increment(1);
            notifications::insert(
                &self.db,
                user_id,
                &format!("Provider {provider} connected; tier assignments updated."),
            )
            .await?;
        }
        self.recalculate(user_id).await?;
        Ok((row, created))
    }

    /// Disconnects a provider: clears every override that resolves to
    /// it, deactivates the row, recalculates, and returns one
    /// user-facing message per cleared tier describing the fallback.
    pub async fn remove_provider(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Vec<String>, ModelmuxError> {
        let provider = provider.trim().to_lowercase();
        if providers::find(&self.db, user_id, &provider).await?.is_none() {
            return Err(ModelmuxError::NotFound {
                kind: "provider",
                name: provider,
            });
        }

        let removed = alias::expand_provider_names([provider.as_str()]);
        let cleared = self.clear_overrides_backed_by(user_id, &removed).await?;

        providers::deactivate(&self.db, user_id, &provider).await?;
        self.recalculate(user_id).await?;

        let after = assignments::get_for_user(&self.db, user_id).await?;
        let mut messages = Vec::with_capacity(cleared.len());
        for (tier, old_model) in cleared {
            let fallback = after
                .iter()
                .find(|r| r.tier == tier)
                .and_then(|r| r.auto_assigned_model.as_deref());
            let message = match fallback {
                Some(model) => format!(
                    "Your {tier} tier override {old_model} was cleared because provider \
                     {provider} was disconnected; now using {model}."
                ),
                None => format!(
                    "Your {tier} tier override {old_model} was cleared because provider \
                     {provider} was disconnected; no model is currently available."
                ),
            };
            notifications::insert(&self.db, user_id, &message).await?;
            messages.push(message);
        }
        if !messages.is_empty() {
            info!(
                user_id,
                provider = %provider,
                cleared = messages.len(),
                "overrides cleared on disconnect"
            );
        }
        Ok(messages)
    }

    /// Disconnects every provider at once. Overrides backed by any of
    /// them are cleared with a notification, as in [`remove_provider`].
    ///
    /// [`remove_provider`]: AssignmentService::remove_provider
    pub async fn deactivate_all_providers(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, ModelmuxError> {
        let active = providers::list_active(&self.db, user_id).await?;
        let reachable =
            alias::expand_provider_names(active.iter().map(|p| p.provider.as_str()));
        let cleared = self.clear_overrides_backed_by(user_id, &reachable).await?;

        providers::deactivate_all(&self.db, user_id).await?;
        self.recalculate(user_id).await?;

        let mut messages = Vec::with_capacity(cleared.len());
        for (tier, old_model) in cleared {
            // With no providers left, every auto assignment is empty.
            let message = format!(
                "Your {tier} tier override {old_model} was cleared because all providers \
                 were disconnected; no model is currently available."
            );
            notifications::insert(&self.db, user_id, &message).await?;
            messages.push(message);
        }
        Ok(messages)
    }

    /// Clears overrides whose model resolves to one of the given
    /// (lowercased) providers. Returns the cleared (tier, model) pairs.
    async fn clear_overrides_backed_by(
        &self,
        user_id: &str,
        provider_names: &HashSet<String>,
    ) -> Result<Vec<(Tier, String)>, ModelmuxError> {
        let rows = assignments::get_for_user(&self.db, user_id).await?;
        let mut cleared = Vec::new();
        for row in &rows {
            let Some(override_model) = &row.override_model else {
                continue;
            };
            let Some(entry) = self.cache.get_by_model(override_model) else {
                continue;
            };
            if provider_names.contains(&entry.provider.to_lowercase()) {
                assignments::set_override_model(&self.db, user_id, row.tier, None).await?;
                cleared.push((row.tier, override_model.clone()));
            }
        }
        Ok(cleared)
    }

    /// Catalog-sync callback: clears overrides referencing models that
    /// left the catalog, across all users, then recalculates each
    /// affected user once. Returns how many overrides were cleared.
    pub async fn invalidate_overrides_for_removed_models(
        &self,
        removed: &[String],
    ) -> Result<usize, ModelmuxError> {
        if removed.is_empty() {
            return Ok(0);
        }

        let hits = assignments::overrides_referencing(&self.db, removed).await?;
        let mut affected_users: Vec<String> = Vec::new();
        for hit in &hits {
            assignments::set_override_model(&self.db, &hit.user_id, hit.tier, None).await?;
            if let Some(model) = &hit.override_model {
                notifications::insert(
                    &self.db,
                    &hit.user_id,
                    &format!(
                        "Your {tier} tier override {model} was cleared because the model \
                         left the catalog.",
                        tier = hit.tier
                    ),
                )
                .await?;
            }
            if !affected_users.contains(&hit.user_id) {
                affected_users.push(hit.user_id.clone());
            }
        }
        for user_id in &affected_users {
            self.recalculate(user_id).await?;
        }
        if !hits.is_empty() {
            info!(
                cleared = hits.len(),
                users = affected_users.len(),
                "overrides invalidated for removed models"
            );
        }
        Ok(hits.len())
    }

    /// Resolves the model a caller should use for one assignment row.
    ///
    /// The override wins only when it still resolves in the cache and
    /// its provider is reachable; any verification failure falls back
    /// to the auto-assigned model. `None` means the tier currently has
    /// no usable model at all.
    pub async fn effective_model(
        &self,
        user_id: &str,
        assignment: &TierAssignment,
    ) -> Result<Option<EffectiveModel>, ModelmuxError> {
        if let Some(override_model) = &assignment.override_model {
            if let Some(entry) = self.cache.get_by_model(override_model) {
                let reachable = self.reachable_providers(user_id).await?;
                if reachable.contains(&entry.provider.to_lowercase()) {
                    return Ok(Some(EffectiveModel {
                        model: override_model.clone(),
                        provider: Some(entry.provider),
                    }));
                }
            }
            debug!(
                user_id,
                tier = %assignment.tier,
                "override failed verification, using auto assignment"
            );
        }
        Ok(assignment.auto_assigned_model.as_ref().map(|auto| EffectiveModel {
            model: auto.clone(),
            provider: self.cache.get_by_model(auto).map(|e| e.provider),
        }))
    }

    /// Catalog entries reachable through the user's active providers,
    /// sorted by model name.
    pub async fn available_models(
        &self,
        user_id: &str,
    ) -> Result<Vec<CatalogEntry>, ModelmuxError> {
        let reachable = self.reachable_providers(user_id).await?;
        let mut models = self.candidates(&reachable);
        models.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        Ok(models)
    }

    /// All provider rows for a user, active or not.
    pub async fn list_providers(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConnectedProvider>, ModelmuxError> {
        providers::list(&self.db, user_id).await
    }

    /// Recent notifications for a user, newest first.
    pub async fn notifications(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Notification>, ModelmuxError> {
        notifications::list_recent(&self.db, user_id, limit).await
    }
}
