// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog discovery against a local model server.
//!
//! Polls an Ollama-style endpoint for the models it currently serves
//! and folds them into the pricing catalog as zero-price entries, with
//! capability and context-window inference from names and families.

pub mod client;
pub mod sync;

pub use client::{CatalogSource, DiscoveredModel, ModelDetails, OllamaClient};
pub use sync::{CatalogSync, SyncOutcome};
