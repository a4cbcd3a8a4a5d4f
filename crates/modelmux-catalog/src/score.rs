// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality scoring for catalog entries.
//!
//! Maps price, capabilities, and context window to a 1-5 score. The
//! logic is an ordered rule table evaluated top to bottom; the ordering
//! is load-bearing, so keep it a flat list rather than nested
//! conditionals. A small manual-override table takes precedence for
//! models the formula misjudges.

use std::collections::HashMap;
use std::sync::LazyLock;

use modelmux_core::CatalogEntry;
use regex::Regex;

/// Editorial scores for models the price/capability formula gets wrong.
/// Kept minimal on purpose; every entry here should be one where the
/// formula's own answer differs.
static MANUAL_SCORES: LazyLock<HashMap<&'static str, u8>> = LazyLock::new(|| {
    HashMap::from([
        ("deepseek-v3", 4),
        ("kimi-k2", 4),
        ("grok-code-fast-1", 3),
    ])
});

/// Lite-variant naming: matched as a whole word so `gemini` never
/// counts as mini.
static MINI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:mini|nano|haiku|micro)\b").unwrap());

const BIG_CONTEXT_TOKENS: u32 = 1_000_000;

/// Derived inputs the rule table matches on.
struct Signals {
    total_per_million: f64,
    reasoning: bool,
    code: bool,
    has_both: bool,
    is_mini: bool,
    big_context: bool,
}

impl Signals {
    fn from_entry(entry: &CatalogEntry) -> Self {
        let reasoning = entry.capability_reasoning;
        let code = entry.capability_code;
        Signals {
            total_per_million: entry.total_price_per_million(),
            reasoning,
            code,
            has_both: reasoning && code,
            is_mini: MINI_PATTERN.is_match(&entry.model_name),
            big_context: entry.context_window >= BIG_CONTEXT_TOKENS,
        }
    }

    fn free(&self) -> bool {
        self.total_per_million == 0.0
    }
}

/// Ordered scoring rules; the first matching predicate wins. The zero
/// price group comes first so local/free models never hit the priced
/// thresholds, and the final catch-all keeps the table total.
const RULES: &[(fn(&Signals) -> bool, u8)] = &[
    (|s| s.free() && s.has_both && !s.is_mini, 3),
    (|s| s.free() && s.reasoning && !s.is_mini, 3),
    (|s| s.free() && s.reasoning && s.is_mini, 2),
    (|s| s.free() && s.code, 2),
    (|s| s.free(), 1),
    (|s| s.total_per_million >= 8.0 && s.has_both && !s.is_mini, 5),
    (|s| s.total_per_million >= 8.0 && s.code && s.big_context, 5),
    (|s| s.total_per_million >= 1.0 && s.reasoning && !s.is_mini, 4),
    (|s| s.total_per_million >= 8.0 && s.code, 4),
    (|s| s.total_per_million >= 3.0 && s.code && !s.is_mini, 3),
    (|s| s.total_per_million >= 0.50 && s.has_both && !s.is_mini, 3),
    (|s| s.reasoning && s.is_mini && s.total_per_million >= 0.50, 3),
    (|s| s.code, 2),
    (|_| true, 1),
];

/// Scores a catalog entry 1-5. Pure and total: manual overrides first,
/// then the rule table.
pub fn quality_score(entry: &CatalogEntry) -> u8 {
    if let Some(score) = MANUAL_SCORES.get(entry.model_name.as_str()) {
        return *score;
    }
    let signals = Signals::from_entry(entry);
    RULES
        .iter()
        .find(|(matches, _)| matches(&signals))
        .map(|(_, score)| *score)
        .unwrap_or(1)
}
