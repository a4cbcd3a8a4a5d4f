// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared domain types for the routing engine.
//!
//! These are the canonical types used across crate boundaries. The storage
//! crate persists them, the catalog crate caches them, and the routing crate
//! computes over them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The four service levels a routing decision targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Greetings, single-fact lookups, yes/no. Cheapest model wins.
    Simple,
    /// General conversation and Q&A. Cheapest acceptable-quality model.
    Standard,
    /// Multi-step analysis and code. Highest quality wins.
    Complex,
    /// Proofs, derivations, hard planning. Highest-quality reasoning model.
    Reasoning,
}

impl Tier {
    /// All tiers in assignment order.
    pub const ALL: [Tier; 4] = [Tier::Simple, Tier::Standard, Tier::Complex, Tier::Reasoning];
}

/// Price/capability metadata for one model, mirroring a persisted pricing row.
///
/// `model_name` is the globally unique key. Prices are per single token in
/// USD; callers that reason about per-million pricing go through
/// [`CatalogEntry::total_price_per_million`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub model_name: String,
    /// Free-text provider name; compared case-insensitively.
    pub provider: String,
    pub input_price_per_token: f64,
    pub output_price_per_token: f64,
    pub context_window: u32,
    pub capability_reasoning: bool,
    pub capability_code: bool,
    /// 1-5. Must equal the scorer's output except transiently between a
    /// catalog write and the next cache rebuild.
    pub quality_score: u8,
}

impl CatalogEntry {
    /// Combined input+output price per million tokens.
    pub fn total_price_per_million(&self) -> f64 {
        (self.input_price_per_token + self.output_price_per_token) * 1_000_000.0
    }
}

/// A provider a user has connected, with soft-delete semantics.
///
/// At most one row exists per `(user_id, provider)`. Disconnecting
/// deactivates the row rather than deleting it so history is preserved.
#[derive(Clone, PartialEq)]
pub struct ConnectedProvider {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    /// Raw credential. Never serialized; surfaces only as [`key_prefix`].
    ///
    /// [`key_prefix`]: ConnectedProvider::key_prefix
    pub credential: Option<String>,
    pub is_active: bool,
    /// ISO 8601 timestamp.
    pub connected_at: String,
}

impl ConnectedProvider {
    pub fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// First eight characters of the credential, for display.
    pub fn key_prefix(&self) -> Option<String> {
        self.credential.as_deref().and_then(|c| {
            if c.is_empty() {
                None
            } else {
                Some(c.chars().take(8).collect())
            }
        })
    }
}

impl std::fmt::Debug for ConnectedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedProvider")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("credential", &self.credential.as_ref().map(|_| "[redacted]"))
            .field("is_active", &self.is_active)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

/// One user's assignment record for one tier.
///
/// Exactly four rows exist per initialized user. The effective model for a
/// read is `override_model` if it still verifies against the cache and the
/// user's active providers, else `auto_assigned_model`; that fallback is
/// evaluated at read time by the assignment service, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAssignment {
    pub user_id: String,
    pub tier: Tier,
    /// User-chosen pin, subordinate to connectivity verification at read time.
    pub override_model: Option<String>,
    /// System-computed best model, refreshed on provider/catalog change.
    pub auto_assigned_model: Option<String>,
    /// ISO 8601 timestamp.
    pub updated_at: String,
}

/// A user-facing notice recorded when the system changes routing on the
/// user's behalf (override cleared, provider connected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Current time as an ISO 8601 string, the storage timestamp format.
pub fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
