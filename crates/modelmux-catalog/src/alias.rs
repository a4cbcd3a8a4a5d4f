// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alias resolution for provider and model names.
//!
//! Providers ship the same model under more than one name (rebrands,
//! dated snapshots, gateway-style `provider/model` paths), and the
//! companies themselves go by different names across marketplaces.
//! This module maps those spellings back onto the canonical names the
//! catalog stores.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Provider names that refer to the same organisation. Each pair is
/// expanded in both directions, so a filter on either name matches
/// catalog rows stored under the other.
const PROVIDER_ALIAS_PAIRS: &[(&str, &str)] = &[
    ("gemini", "google"),
    ("qwen", "alibaba"),
    ("meta", "meta-llama"),
    ("mistral", "mistralai"),
    ("xai", "x-ai"),
];

static PROVIDER_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(PROVIDER_ALIAS_PAIRS.len() * 2);
    for (a, b) in PROVIDER_ALIAS_PAIRS {
        map.insert(*a, *b);
        map.insert(*b, *a);
    }
    map
});

/// Rebranded model names. Keys are the names seen in requests, values
/// are the canonical catalog names.
static MODEL_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("deepseek-chat", "deepseek-v3"),
        ("deepseek-reasoner", "deepseek-r1"),
        ("gemini-flash-latest", "gemini-2.5-flash"),
        ("claude-3-5-sonnet", "claude-3-5-sonnet-20241022"),
    ])
});

/// Trailing version markers: a dated snapshot (`-2025-04-14` or
/// `-20250414`) or a dotted build number (`-1.5`, `-0.0.8`). A bare
/// trailing integer is left alone so names like `gpt-5` or `grok-4`
/// never lose their generation digit.
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(?:\d{4}-\d{2}-\d{2}|\d{8}|\d+(?:\.\d+)+)$").unwrap());

/// Lowercases and expands a set of provider names so that either half
/// of a known alias pair matches rows stored under the other half.
///
/// Names without an alias pass through unchanged: expanding
/// `["deepseek"]` yields just `{"deepseek"}`.
pub fn expand_provider_names<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expanded = HashSet::new();
    for name in names {
        let lower = name.as_ref().to_lowercase();
        if let Some(alias) = PROVIDER_ALIASES.get(lower.as_str()) {
            expanded.insert((*alias).to_string());
        }
        expanded.insert(lower);
    }
    expanded
}

fn strip_provider_prefix(name: &str) -> Option<&str> {
    match name.split_once('/') {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => Some(rest),
        _ => None,
    }
}

fn strip_version_suffix(name: &str) -> Option<String> {
    let stripped = VERSION_SUFFIX.replace(name, "");
    if stripped == name {
        None
    } else {
        Some(stripped.into_owned())
    }
}

/// Resolves a requested model name against the set of canonical names
/// the catalog currently knows.
///
/// Each rewrite is tried in order and the first one producing a known
/// name wins: strip a `provider/` path prefix, strip one trailing
/// version marker, apply the static rebrand table, then prefix and
/// version strip combined. Returns `None` when no rewrite lands on a
/// known name; exact matches are expected to be checked by the caller
/// before resolution is attempted.
pub fn resolve_model_name(requested: &str, known: &HashSet<String>) -> Option<String> {
    if let Some(rest) = strip_provider_prefix(requested) {
        if known.contains(rest) {
            return Some(rest.to_string());
        }
    }
    if let Some(stripped) = strip_version_suffix(requested) {
        if known.contains(&stripped) {
            return Some(stripped);
        }
    }
    if let Some(canonical) = MODEL_ALIASES.get(requested) {
        if known.contains(*canonical) {
            return Some((*canonical).to_string());
        }
    }
    if let Some(rest) = strip_provider_prefix(requested) {
        if let Some(stripped) = strip_version_suffix(rest) {
            if known.contains(&stripped) {
                return Some(stripped);
            }
        }
    }
    None
}
