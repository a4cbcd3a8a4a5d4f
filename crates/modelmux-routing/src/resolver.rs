// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-time tier resolution.
//!
//! Classifies an inbound conversational turn into a tier, then asks
//! the assignment service for that tier's effective model. A tier with
//! no usable model resolves to `model: none` rather than an error;
//! absence is a normal, representable outcome here.

use std::sync::Arc;

use modelmux_core::{ModelmuxError, Tier};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{Classification, ClassifyInput, HeuristicClassifier, TierClassifier};
use crate::service::AssignmentService;

/// One turn of the conversation being routed.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A routing request as received from the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Tool definitions attached to the request, shape opaque here.
    #[serde(default)]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub tool_choice: Option<serde_json::Value>,
    /// Tier label the previous turn resolved to, if the caller tracks it.
    #[serde(default)]
    pub prior_tier: Option<Tier>,
    /// Tier labels of recent turns, oldest first.
    #[serde(default)]
    pub recent_tiers: Option<Vec<Tier>>,
}

/// The routing answer: which tier, and which model serves it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
    pub tier: Tier,
    /// `None` when the tier currently has no usable model.
    pub model: Option<String>,
    pub provider: Option<String>,
    pub reason: String,
    pub confidence: f32,
    pub score: i32,
}

/// Resolves inbound turns to `{tier, model, provider}`.
pub struct TierResolver {
    assignments: Arc<AssignmentService>,
    classifier: Box<dyn TierClassifier>,
}

impl TierResolver {
    pub fn new(assignments: Arc<AssignmentService>) -> Self {
        Self {
            assignments,
            classifier: Box::new(HeuristicClassifier::new()),
        }
    }

    pub fn with_classifier(
        assignments: Arc<AssignmentService>,
        classifier: Box<dyn TierClassifier>,
    ) -> Self {
        Self {
            assignments,
            classifier,
        }
    }

    /// Classifies the latest user turn and resolves its tier's
    /// effective model.
    pub async fn resolve(
        &self,
        user_id: &str,
        request: &RouteRequest,
    ) -> Result<RouteDecision, ModelmuxError> {
        let message = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let has_tools = request.tools.as_ref().is_some_and(|t| !t.is_empty())
            || request.tool_choice.is_some();

        let mut recent_tiers = request.recent_tiers.clone().unwrap_or_default();
        if let Some(prior) = request.prior_tier {
            recent_tiers.push(prior);
        }

        let classification = self.classifier.classify(&ClassifyInput {
            message,
            has_tools,
            recent_tiers: &recent_tiers,
        });
        self.decide(user_id, classification).await
    }

    /// Resolves a fixed tier without classification, for connectivity
    /// heartbeats.
    pub async fn resolve_for_tier(
        &self,
        user_id: &str,
        tier: Tier,
    ) -> Result<RouteDecision, ModelmuxError> {
        self.decide(
            user_id,
            Classification {
                tier,
                confidence: 1.0,
                score: 0,
                reason: "heartbeat",
            },
        )
        .await
    }

    async fn decide(
        &self,
        user_id: &str,
        classification: Classification,
    ) -> Result<RouteDecision, ModelmuxError> {
        let rows = self.assignments.get_tiers(user_id).await?;
        let row = rows.into_iter().find(|r| r.tier == classification.tier);
        let effective = match &row {
            Some(row) => self.assignments.effective_model(user_id, row).await?,
            None => None,
        };
        let (model, provider) = match effective {
            Some(e) => (Some(e.model), e.provider),
            None => (None, None),
        };

        metrics::counter!(
            "modelmux_route_decisions_total",
            "tier" => classification.tier.to_string()
        )
        .increment(1);
        debug!(
            user_id,
            tier = %classification.tier,
            model = model.as_deref().unwrap_or("none"),
            reason = classification.reason,
            "route decision"
        );

        Ok(RouteDecision {
            tier: classification.tier,
            model,
            provider,
            reason: classification.reason.to_string(),
            confidence: classification.confidence,
            score: classification.score,
        })
    }
}
