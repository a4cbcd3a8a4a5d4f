// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model catalog services: the in-memory pricing cache, provider and
//! model alias resolution, and the quality scoring rules that rank
//! catalog entries for tier selection.

pub mod alias;
pub mod cache;
pub mod score;

pub use alias::{expand_provider_names, resolve_model_name};
pub use cache::{PricingCache, ReloadStats};
pub use score::quality_score;
