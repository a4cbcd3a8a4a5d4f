// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete modelmux pipeline.
//!
//! Each test builds an isolated gateway router over an in-memory SQLite
//! database with a static discovery source. Tests are independent and
//! order-insensitive.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use modelmux_catalog::PricingCache;
use modelmux_core::ModelmuxError;
use modelmux_discovery::{CatalogSource, CatalogSync, DiscoveredModel};
use modelmux_gateway::{build_router, AuthConfig, GatewayState, HealthState};
use modelmux_routing::{AssignmentService, TierResolver};
use modelmux_storage::Database;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StaticSource(Vec<&'static str>);

#[async_trait]
impl CatalogSource for StaticSource {
    async fn list_models(&self) -> Result<Vec<DiscoveredModel>, ModelmuxError> {
        Ok(self
            .0
            .iter()
            .map(|name| DiscoveredModel {
                name: name.to_string(),
                details: None,
            })
            .collect())
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

async fn router(token: Option<&str>) -> Router {
    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let cache = Arc::new(PricingCache::new(db.clone()));
    cache.reload().await.unwrap();
    let assignments = Arc::new(AssignmentService::new(db.clone(), cache.clone()));
    let resolver = Arc::new(TierResolver::new(assignments.clone()));
    let sync = Arc::new(CatalogSync::new(
        db,
        cache,
        assignments.clone(),
        Box::new(StaticSource(vec!["llama3:8b", "qwq:32b"])),
    ));
    build_router(GatewayState {
        assignments,
        resolver,
        sync,
        auth: AuthConfig {
            bearer_token: token.map(str::to_string),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render: None,
        },
    })
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "tenant-a");
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

/// Sends a request, asserts a 2xx response, and parses the JSON body.
async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
    let response = send(app, request(method.clone(), uri, body)).await;
    assert!(
        response.status().is_success(),
        "{method} {uri} returned {}",
        response.status()
    );
    read_json(response).await
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn connect(app: &Router, provider: &str) {
    send_json(
        app,
        Method::POST,
        "/api/v1/providers",
        Some(json!({
            "provider": provider,
            "credential": format!("sk-{provider}-0123456789"),
        })),
    )
    .await;
}

fn tier_row<'a>(tiers: &'a Value, label: &str) -> &'a Value {
    tiers
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["tier"] == label)
        .unwrap()
}

// ---- Test 1: Override invalidation on provider disconnect ----

#[tokio::test]
async fn test_disconnect_clears_override_and_notifies_over_http() {
    let app = router(None).await;
    connect(&app, "openai").await;
    connect(&app, "anthropic").await;

    send_json(
        &app,
        Method::PUT,
        "/api/v1/tiers/complex",
        Some(json!({ "model": "o4-mini" })),
    )
    .await;

    let tiers = send_json(&app, Method::GET, "/api/v1/tiers", None).await;
    assert_eq!(tier_row(&tiers, "complex")["overrideModel"], "o4-mini");

    // Disconnecting the provider behind the pinned model clears the pin.
    let disconnect = send_json(&app, Method::DELETE, "/api/v1/providers/openai", None).await;
    assert_eq!(disconnect["ok"], true);
    let notices = disconnect["notifications"].as_array().unwrap();
    assert_eq!(notices.len(), 1);
    let message = notices[0].as_str().unwrap();
    assert!(message.contains("complex tier override o4-mini was cleared"));
    assert!(message.contains("now using claude-sonnet-4-5"));

    let tiers = send_json(&app, Method::GET, "/api/v1/tiers", None).await;
    let complex = tier_row(&tiers, "complex");
    assert_eq!(complex["overrideModel"], Value::Null);
    assert_eq!(complex["autoAssignedModel"], "claude-sonnet-4-5");

    // The notice is durable, not just returned inline.
    let stored = send_json(&app, Method::GET, "/api/v1/notifications", None).await;
    assert!(stored
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["message"].as_str().unwrap().contains("was cleared")));
}

// ---- Test 2: Tier assignments recalculate as providers connect ----

#[tokio::test]
async fn test_assignments_recalculate_on_each_connect() {
    let app = router(None).await;
    connect(&app, "openai").await;

    let tiers = send_json(&app, Method::GET, "/api/v1/tiers", None).await;
    assert_eq!(
        tier_row(&tiers, "simple")["autoAssignedModel"],
        "gpt-4.1-nano"
    );
    assert_eq!(
        tier_row(&tiers, "standard")["autoAssignedModel"],
        "gpt-4.1-nano"
    );
    assert_eq!(tier_row(&tiers, "complex")["autoAssignedModel"], "gpt-4.1");
    assert_eq!(tier_row(&tiers, "reasoning")["autoAssignedModel"], "o4-mini");

    connect(&app, "anthropic").await;

    // The cheaper of the two top-quality models keeps complex; the
    // highest-quality reasoning-capable model takes over reasoning.
    let tiers = send_json(&app, Method::GET, "/api/v1/tiers", None).await;
    assert_eq!(tier_row(&tiers, "complex")["autoAssignedModel"], "gpt-4.1");
    assert_eq!(
        tier_row(&tiers, "reasoning")["autoAssignedModel"],
        "claude-sonnet-4-5"
    );
}

// ---- Test 3: Message resolution over the HTTP surface ----

#[tokio::test]
async fn test_resolve_routes_greeting_to_cheapest_model() {
    let app = router(None).await;
    connect(&app, "openai").await;

    let decision = send_json(
        &app,
        Method::POST,
        "/api/v1/resolve",
        Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
    )
    .await;

    assert_eq!(decision["tier"], "simple");
    assert_eq!(decision["model"], "gpt-4.1-nano");
    assert_eq!(decision["provider"], "openai");
}

// ---- Test 4: Deactivate-all clears overrides for the tenant ----

#[tokio::test]
async fn test_deactivate_all_clears_overrides_and_empties_tiers() {
    let app = router(None).await;
    connect(&app, "openai").await;
    send_json(
        &app,
        Method::PUT,
        "/api/v1/tiers/standard",
        Some(json!({ "model": "gpt-4.1-mini" })),
    )
    .await;

    let response = send_json(&app, Method::POST, "/api/v1/providers/deactivate-all", None).await;
    assert_eq!(response["ok"], true);
    assert!(response["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n.as_str().unwrap().contains("all providers were disconnected")));

    let tiers = send_json(&app, Method::GET, "/api/v1/tiers", None).await;
    for row in tiers.as_array().unwrap() {
        assert_eq!(row["overrideModel"], Value::Null);
        assert_eq!(row["autoAssignedModel"], Value::Null);
    }
}

// ---- Test 5: Catalog sync feeds available models ----

#[tokio::test]
async fn test_catalog_sync_extends_available_models() {
    let app = router(None).await;

    let synced = send_json(&app, Method::POST, "/api/v1/catalog/sync", None).await;
    assert_eq!(synced["count"], 2);

    connect(&app, "ollama").await;
    let models = send_json(&app, Method::GET, "/api/v1/available-models", None).await;
    let names: Vec<&str> = models
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["modelName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["llama3:8b", "qwq:32b"]);
}

// ---- Test 6: Bearer auth across the API surface ----

#[tokio::test]
async fn test_bearer_token_guards_api_but_not_health() {
    let app = router(Some("e2e-secret")).await;

    let denied = send(&app, request(Method::GET, "/api/v1/tiers", None)).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let mut authed = request(Method::GET, "/api/v1/tiers", None);
    authed.headers_mut().insert(
        axum::http::header::AUTHORIZATION,
        "Bearer e2e-secret".parse().unwrap(),
    );
    let granted = send(&app, authed).await;
    assert_eq!(granted.status(), StatusCode::OK);

    let health = send(&app, request(Method::GET, "/health", None)).await;
    assert_eq!(health.status(), StatusCode::OK);
}
