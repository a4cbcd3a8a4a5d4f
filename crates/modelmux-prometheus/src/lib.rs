// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics exporter for the modelmux routing engine.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Library crates
//! emit counters and gauges through the facade; this crate installs the
//! recorder and renders the Prometheus text format for the gateway's
//! `/metrics` endpoint.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use modelmux_core::ModelmuxError;

pub use recording::register_metrics;

/// Prometheus metrics exporter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Create a new exporter.
    ///
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process. Returns an error if a recorder is already
    /// installed.
    pub fn new() -> Result<Self, ModelmuxError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            ModelmuxError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Get a reference to the Prometheus handle for rendering.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_and_render() {
        // The recorder can only be installed once per process, so this is
        // the single test exercising it.
        let exporter = PrometheusExporter::new().unwrap();
        metrics::counter!("modelmux_catalog_reloads_total").increment(1);
        metrics::gauge!("modelmux_catalog_models").set(14.0);
        let text = exporter.render();
        assert!(text.contains("modelmux_catalog_reloads_total"), "got: {text}");
        assert!(text.contains("modelmux_catalog_models"), "got: {text}");
    }
}
