// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Every `/api/v1` route is tenant-scoped via the `x-user-id` header and
//! speaks camelCase JSON. Provider rows are projected through [`ProviderView`]
//! so raw credentials never reach a response body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use modelmux_core::{
    CatalogEntry, ConnectedProvider, ModelmuxError, Notification, Tier, TierAssignment,
};
use modelmux_routing::{RouteDecision, RouteRequest};

use crate::auth::UserId;
use crate::server::GatewayState;

/// Notifications returned per listing request, newest first.
const NOTIFICATION_LIMIT: u32 = 20;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Core error wrapped for HTTP status mapping.
///
/// Not-found maps to 404, invalid input to 400, everything else to a
/// generic 500 whose detail goes to the log rather than the client.
pub struct ApiError(pub ModelmuxError);

impl From<ModelmuxError> for ApiError {
    fn from(err: ModelmuxError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ModelmuxError::NotFound { .. } => StatusCode::NOT_FOUND,
            ModelmuxError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// A connected provider as exposed over HTTP.
///
/// Carries the credential's display prefix, never the credential itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub id: String,
    pub provider: String,
    pub is_active: bool,
    pub has_credential: bool,
    pub key_prefix: Option<String>,
    pub connected_at: String,
}

impl From<&ConnectedProvider> for ProviderView {
    fn from(row: &ConnectedProvider) -> Self {
        Self {
            id: row.id.clone(),
            provider: row.provider.clone(),
            is_active: row.is_active,
            has_credential: row.has_credential(),
            key_prefix: row.key_prefix(),
            connected_at: row.connected_at.clone(),
        }
    }
}

/// Request body for POST /api/v1/providers.
#[derive(Debug, Deserialize)]
pub struct ConnectProviderRequest {
    pub provider: String,
    #[serde(default)]
    pub credential: Option<String>,
}

/// Response body for POST /api/v1/providers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConnectedResponse {
    pub id: String,
    pub provider: String,
    pub is_active: bool,
}

/// Response body for provider disconnect operations.
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub ok: bool,
    pub notifications: Vec<String>,
}

/// Request body for PUT /api/v1/tiers/{tier}.
#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub model: String,
}

/// Minimal acknowledgement body.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Response body for POST /api/v1/tiers/reset-all.
#[derive(Debug, Serialize)]
pub struct ResetAllResponse {
    pub ok: bool,
    pub cleared: usize,
}

/// Response body for POST /api/v1/catalog/sync.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub count: usize,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

fn parse_tier(label: &str) -> Result<Tier, ApiError> {
    label
        .parse::<Tier>()
        .map_err(|_| ApiError(ModelmuxError::InvalidRequest(format!("unknown tier `{label}`"))))
}

/// GET /api/v1/providers
pub async fn get_providers(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<Vec<ProviderView>>, ApiError> {
    let rows = state.assignments.list_providers(&user.0).await?;
    Ok(Json(rows.iter().map(ProviderView::from).collect()))
}

/// POST /api/v1/providers
pub async fn post_providers(
    State(state): State<GatewayState>,
    user: UserId,
    Json(body): Json<ConnectProviderRequest>,
) -> Result<Json<ProviderConnectedResponse>, ApiError> {
    let (row, _created) = state
        .assignments
        .upsert_provider(&user.0, &body.provider, body.credential)
        .await?;
    Ok(Json(ProviderConnectedResponse {
        id: row.id,
        provider: row.provider,
        is_active: row.is_active,
    }))
}

/// POST /api/v1/providers/deactivate-all
pub async fn post_providers_deactivate_all(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let notifications = state.assignments.deactivate_all_providers(&user.0).await?;
    Ok(Json(DisconnectResponse {
        ok: true,
        notifications,
    }))
}

/// DELETE /api/v1/providers/{provider}
pub async fn delete_provider(
    State(state): State<GatewayState>,
    user: UserId,
    Path(provider): Path<String>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let notifications = state.assignments.remove_provider(&user.0, &provider).await?;
    Ok(Json(DisconnectResponse {
        ok: true,
        notifications,
    }))
}

/// GET /api/v1/tiers
pub async fn get_tiers(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<Vec<TierAssignment>>, ApiError> {
    Ok(Json(state.assignments.get_tiers(&user.0).await?))
}

/// PUT /api/v1/tiers/{tier}
pub async fn put_tier(
    State(state): State<GatewayState>,
    user: UserId,
    Path(tier): Path<String>,
    Json(body): Json<SetOverrideRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let tier = parse_tier(&tier)?;
    state.assignments.set_override(&user.0, tier, &body.model).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// DELETE /api/v1/tiers/{tier}
pub async fn delete_tier(
    State(state): State<GatewayState>,
    user: UserId,
    Path(tier): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let tier = parse_tier(&tier)?;
    state.assignments.clear_override(&user.0, tier).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/v1/tiers/reset-all
pub async fn post_tiers_reset(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<ResetAllResponse>, ApiError> {
    let cleared = state.assignments.reset_all(&user.0).await?;
    Ok(Json(ResetAllResponse { ok: true, cleared }))
}

/// GET /api/v1/available-models
pub async fn get_available_models(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    Ok(Json(state.assignments.available_models(&user.0).await?))
}

/// POST /api/v1/catalog/sync
///
/// The catalog is shared across tenants, so the sync does not read the
/// user header; override invalidation inside the sync covers every user.
pub async fn post_catalog_sync(
    State(state): State<GatewayState>,
) -> Result<Json<SyncResponse>, ApiError> {
    let outcome = state.sync.run().await?;
    Ok(Json(SyncResponse {
        count: outcome.count,
    }))
}

/// POST /api/v1/resolve
pub async fn post_resolve(
    State(state): State<GatewayState>,
    user: UserId,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteDecision>, ApiError> {
    Ok(Json(state.resolver.resolve(&user.0, &request).await?))
}

/// GET /api/v1/resolve/{tier}
pub async fn get_resolve_tier(
    State(state): State<GatewayState>,
    user: UserId,
    Path(tier): Path<String>,
) -> Result<Json<RouteDecision>, ApiError> {
    let tier = parse_tier(&tier)?;
    Ok(Json(state.resolver.resolve_for_tier(&user.0, tier).await?))
}

/// GET /api/v1/notifications
pub async fn get_notifications(
    State(state): State<GatewayState>,
    user: UserId,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        state
            .assignments
            .notifications(&user.0, NOTIFICATION_LIMIT)
            .await?,
    ))
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
