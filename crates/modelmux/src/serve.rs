// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelmux serve` command implementation.
//!
//! Starts the full modelmux gateway: SQLite-backed catalog and tier
//! assignments, the message-to-tier resolver, local model discovery,
//! and the Prometheus exporter behind the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use modelmux_catalog::PricingCache;
use modelmux_config::ModelmuxConfig;
use modelmux_core::ModelmuxError;
use modelmux_discovery::{CatalogSync, OllamaClient};
use modelmux_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use modelmux_prometheus::PrometheusExporter;
use modelmux_routing::{AssignmentService, TierResolver};
use modelmux_storage::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs the `modelmux serve` command.
///
/// Opens storage, warms the pricing cache, wires the assignment and
/// resolution services, and serves the HTTP gateway until shutdown.
pub async fn run_serve(config: ModelmuxConfig) -> Result<(), ModelmuxError> {
    init_tracing(&config.server.log_level);

    info!("starting modelmux serve");

    // Storage and the in-memory catalog snapshot.
    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    let cache = Arc::new(PricingCache::new(Arc::clone(&db)));
    let stats = cache.reload().await?;
    info!(models = stats.entries, "model catalog warmed");

    let assignments = Arc::new(AssignmentService::new(Arc::clone(&db), Arc::clone(&cache)));
    let resolver = Arc::new(TierResolver::new(Arc::clone(&assignments)));

    // Local discovery source. Sync stays operator-invocable over the API
    // even when startup discovery is disabled.
    let client = OllamaClient::with_timeout(
        &config.discovery.base_url,
        Duration::from_secs(config.discovery.timeout_secs),
    )?;
    let sync = Arc::new(CatalogSync::new(
        Arc::clone(&db),
        Arc::clone(&cache),
        Arc::clone(&assignments),
        Box::new(client),
    ));

    if config.discovery.enabled {
        match sync.run().await {
            Ok(outcome) => info!(
                count = outcome.count,
                removed = outcome.removed,
                "startup catalog sync complete"
            ),
            Err(e) => warn!(error = %e, "startup catalog sync failed; serving stored catalog"),
        }
    }

    // Prometheus exporter feeds the unauthenticated /metrics endpoint.
    let prometheus_render = if config.metrics.enabled {
        let exporter = PrometheusExporter::new()?;
        let handle = exporter.handle().clone();
        Some(Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>)
    } else {
        None
    };

    let state = GatewayState {
        assignments,
        resolver,
        sync,
        auth: AuthConfig {
            bearer_token: config.server.auth_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        },
    };

    let server = ServerConfig {
        host: config.server.bind_address.clone(),
        port: config.server.port,
    };
    modelmux_gateway::start_server(&server, state).await?;

    // Checkpoint the WAL on the way out.
    db.close().await?;
    info!("modelmux stopped");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured log level
/// applies to every workspace crate with `warn` for everything else.
fn init_tracing(log_level: &str) {
    // Crate names use underscores, so each needs its own directive.
    let directives = [
        "modelmux",
        "modelmux_core",
        "modelmux_config",
        "modelmux_storage",
        "modelmux_catalog",
        "modelmux_routing",
        "modelmux_discovery",
        "modelmux_gateway",
        "modelmux_prometheus",
    ]
    .map(|krate| format!("{krate}={log_level}"))
    .join(",");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{directives},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
