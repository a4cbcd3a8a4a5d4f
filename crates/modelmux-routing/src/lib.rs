// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing core: picks the best model per tier, keeps per-user tier
//! assignments in sync with provider and catalog changes, and resolves
//! inbound requests to an effective model.

pub mod classifier;
pub mod resolver;
pub mod selector;
pub mod service;

pub use classifier::{Classification, ClassifyInput, HeuristicClassifier, TierClassifier};
pub use resolver::{ChatMessage, RouteDecision, RouteRequest, TierResolver};
pub use selector::{pick_best, TierPick};
pub use service::{AssignmentService, EffectiveModel};
