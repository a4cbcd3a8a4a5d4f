// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration.
//!
//! Library crates record through the metrics-rs facade directly; this module
//! attaches HELP text to every metric name they use.

use metrics::{describe_counter, describe_gauge};

/// Register all modelmux metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "modelmux_catalog_reloads_total",
        "Catalog snapshot reloads from storage"
    );
    describe_counter!(
        "modelmux_score_corrections_total",
        "Stored quality scores corrected during reload"
    );
    describe_counter!(
        "modelmux_unresolved_lookups_total",
        "Model lookups that resolved to no catalog entry"
    );
    describe_counter!(
        "modelmux_recalculations_total",
        "Automatic tier assignment recalculations"
    );
    describe_counter!(
        "modelmux_providers_connected_total",
        "Provider connections created"
    );
    describe_counter!(
        "modelmux_route_decisions_total",
        "Resolve requests answered, labeled by tier"
    );
    describe_counter!(
        "modelmux_catalog_syncs_total",
        "Completed discovery catalog syncs"
    );
    describe_counter!(
        "modelmux_discovery_failures_total",
        "Discovery fetches that failed and degraded to zero models"
    );
    describe_gauge!("modelmux_catalog_models", "Models in the catalog snapshot");
}
