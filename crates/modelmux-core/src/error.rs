// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the modelmux routing engine.

use thiserror::Error;

/// The primary error type used across all modelmux crates.
///
/// Lookup misses and stale overrides are deliberately NOT errors: every read
/// path has a defined empty/fallback result. Errors are reserved for failed
/// writes, bad client input, and broken collaborators.
#[derive(Debug, Error)]
pub enum ModelmuxError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Catalog discovery errors (upstream unreachable, malformed response).
    ///
    /// The sync path downgrades these to "zero models found"; they only
    /// propagate from a direct client call.
    #[error("discovery error: {message}")]
    Discovery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A named entity (provider, tier) does not exist for this user.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Client input that fails validation (empty provider name, unknown tier label).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
