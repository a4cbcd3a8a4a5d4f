// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use modelmux_core::ModelmuxError;
use modelmux_discovery::CatalogSync;
use modelmux_routing::{AssignmentService, TierResolver};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Tier assignment orchestration.
    pub assignments: Arc<AssignmentService>,
    /// Message-to-tier resolution.
    pub resolver: Arc<TierResolver>,
    /// Catalog refresh from the discovery source.
    pub sync: Arc<CatalogSync>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router.
///
/// Public routes (`/health`, `/metrics`) skip authentication; everything
/// under `/api/v1` passes through the bearer-token middleware.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/api/v1/providers",
            get(handlers::get_providers).post(handlers::post_providers),
        )
        .route(
            "/api/v1/providers/deactivate-all",
            post(handlers::post_providers_deactivate_all),
        )
        .route("/api/v1/providers/{provider}", delete(handlers::delete_provider))
        .route("/api/v1/tiers", get(handlers::get_tiers))
        .route("/api/v1/tiers/reset-all", post(handlers::post_tiers_reset))
        .route(
            "/api/v1/tiers/{tier}",
            put(handlers::put_tier).delete(handlers::delete_tier),
        )
        .route("/api/v1/available-models", get(handlers::get_available_models))
        .route("/api/v1/catalog/sync", post(handlers::post_catalog_sync))
        .route("/api/v1/resolve", post(handlers::post_resolve))
        .route("/api/v1/resolve/{tier}", get(handlers::get_resolve_tier))
        .route("/api/v1/notifications", get(handlers::get_notifications))
        .route_layer(axum_middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until ctrl-c.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), ModelmuxError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ModelmuxError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ModelmuxError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
