// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the modelmux routing engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level modelmux configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelmuxConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local model discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bearer token required on `/api/v1` routes. `None` disables auth.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            auth_token: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_path: default_database_path() }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("modelmux").join("modelmux.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("modelmux.db"))
        .to_string_lossy()
        .into_owned()
}

/// Local model discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Run a catalog sync against the local endpoint at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the local model server.
    #[serde(default = "default_discovery_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds for discovery calls.
    #[serde(default = "default_discovery_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_discovery_base_url(),
            timeout_secs: default_discovery_timeout_secs(),
        }
    }
}

fn default_discovery_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_discovery_timeout_secs() -> u64 {
    3
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve Prometheus text format on `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: default_metrics_enabled() }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ModelmuxConfig::default();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_level, "info");
        assert!(config.server.auth_token.is_none());
        assert!(!config.discovery.enabled);
        assert_eq!(config.discovery.base_url, "http://localhost:11434");
        assert_eq!(config.discovery.timeout_secs, 3);
        assert!(config.metrics.enabled);
        assert!(config.storage.database_path.ends_with("modelmux.db"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[server]
port = 8080
"#;
        let config: ModelmuxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let toml_str = r#"
[server]
prot = 8080
"#;
        assert!(toml::from_str::<ModelmuxConfig>(toml_str).is_err());
    }

    #[test]
    fn auth_token_deserializes() {
        let toml_str = r#"
[server]
auth_token = "sk-gateway-secret"
"#;
        let config: ModelmuxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.auth_token.as_deref(), Some("sk-gateway-secret"));
    }
}
