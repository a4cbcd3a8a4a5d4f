// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./modelmux.toml` > `~/.config/modelmux/modelmux.toml`
//! > `/etc/modelmux/modelmux.toml` with environment variable overrides via
//! `MODELMUX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ModelmuxConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/modelmux/modelmux.toml` (system-wide)
/// 3. `~/.config/modelmux/modelmux.toml` (user XDG config)
/// 4. `./modelmux.toml` (local directory)
/// 5. `MODELMUX_*` environment variables
pub fn load_config() -> Result<ModelmuxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelmuxConfig::default()))
        .merge(Toml::file("/etc/modelmux/modelmux.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("modelmux/modelmux.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("modelmux.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ModelmuxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelmuxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ModelmuxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelmuxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. `MODELMUX_SERVER_AUTH_TOKEN` must map to
/// `server.auth_token`, not `server.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("MODELMUX_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MODELMUX_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("discovery_", "discovery.", 1)
            .replacen("metrics_", "metrics.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.discovery.base_url, "http://localhost:11434");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[server]
bind_address = "0.0.0.0"
port = 9100

[discovery]
enabled = true
base_url = "http://ollama.internal:11434"
"#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert!(config.discovery.enabled);
        assert_eq!(config.discovery.base_url, "http://ollama.internal:11434");
        // Untouched sections keep their defaults
        assert!(config.metrics.enabled);
    }

    #[test]
    fn unknown_key_is_a_figment_error() {
        let err = load_config_from_str(
            r#"
[server]
bind_addres = "0.0.0.0"
"#,
        )
        .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("bind_addres"), "got: {rendered}");
    }
}
