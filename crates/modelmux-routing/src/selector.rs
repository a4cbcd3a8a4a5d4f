// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tier model selection over a candidate set.
//!
//! Pure over its inputs: candidates arrive already filtered to the
//! user's reachable providers, and nothing here touches the cache or
//! the network.

use std::cmp::Ordering;

use modelmux_core::{CatalogEntry, Tier};

/// The chosen model for one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierPick {
    pub model_name: String,
    pub score: u8,
}

/// Picks the single best candidate for a tier, or `None` when the
/// candidate set is empty.
///
/// Candidates are ranked on total price ascending with the incoming
/// (catalog) order preserved between equal prices, so repeated calls
/// over the same catalog resolve ties identically. Policies:
///
/// - `simple`: cheapest outright, zero-price included.
/// - `standard`: cheapest with a quality score of at least 2, else the
///   cheapest overall.
/// - `complex`: highest quality score; price ascending breaks ties.
/// - `reasoning`: the complex policy restricted to reasoning-capable
///   candidates, or over the full set when none are.
pub fn pick_best(candidates: &[CatalogEntry], tier: Tier) -> Option<TierPick> {
    if candidates.is_empty() {
        return None;
    }

    let mut by_price: Vec<&CatalogEntry> = candidates.iter().collect();
    by_price.sort_by(|a, b| {
        a.total_price_per_million()
            .partial_cmp(&b.total_price_per_million())
            .unwrap_or(Ordering::Equal)
    });

    let pick = match tier {
        Tier::Simple => by_price[0],
        Tier::Standard => by_price
            .iter()
            .find(|e| e.quality_score >= 2)
            .copied()
            .unwrap_or(by_price[0]),
        Tier::Complex => highest_quality(&by_price)?,
        Tier::Reasoning => {
            let reasoning: Vec<&CatalogEntry> = by_price
                .iter()
                .filter(|e| e.capability_reasoning)
                .copied()
                .collect();
            if reasoning.is_empty() {
                highest_quality(&by_price)?
            } else {
                highest_quality(&reasoning)?
            }
        }
    };

    Some(TierPick {
        model_name: pick.model_name.clone(),
        score: pick.quality_score,
    })
}

/// First entry with the maximum quality score. The input is already
/// price-sorted, so "first" means the cheapest among equals.
fn highest_quality<'a>(by_price: &[&'a CatalogEntry]) -> Option<&'a CatalogEntry> {
    let mut best: Option<&CatalogEntry> = None;
    for entry in by_price {
        match best {
            Some(current) if entry.quality_score <= current.quality_score => {}
            _ => best = Some(entry),
        }
    }
    best
}
