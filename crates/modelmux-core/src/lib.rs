// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the modelmux routing engine.
//!
//! This crate provides the error type and the shared domain types used
//! throughout the modelmux workspace: service tiers, catalog entries,
//! connected providers, and tier assignments.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ModelmuxError;
pub use types::{CatalogEntry, ConnectedProvider, Notification, Tier, TierAssignment};
