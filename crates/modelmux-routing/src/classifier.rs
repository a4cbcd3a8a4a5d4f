// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic message complexity classification.
//!
//! Maps a conversational turn onto one of the four tiers using
//! zero-cost lexical rules. No LLM pre-call, no network, no latency.
//! The resolver talks to this through [`TierClassifier`] so a smarter
//! classifier can be swapped in without touching routing.

use modelmux_core::Tier;

/// Result of classifying one turn.
#[derive(Debug, Clone)]
pub struct Classification {
    pub tier: Tier,
    /// 0.0-1.0.
    pub confidence: f32,
    /// Raw signal sum the tier was mapped from.
    pub score: i32,
    pub reason: &'static str,
}

/// Everything the classifier may consider for one turn.
pub struct ClassifyInput<'a> {
    /// The latest user message text.
    pub message: &'a str,
    /// Whether the request carries tool definitions. Tools floor the
    /// result at standard.
    pub has_tools: bool,
    /// Tier labels of recent turns, oldest first. Momentum biases away
    /// from downgrading mid-task.
    pub recent_tiers: &'a [Tier],
}

/// Seam between routing and tier classification.
pub trait TierClassifier: Send + Sync {
    fn classify(&self, input: &ClassifyInput<'_>) -> Classification;
}

/// Greetings and one-word acknowledgements (exact match, lowercased).
const SIMPLE_EXACT: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "goodbye", "ok",
    "okay", "yes", "no", "sure", "good", "great", "cool", "nice", "yep",
    "nope", "yeah", "nah", "got it",
];

/// Small-talk questions (substring match, lowercased).
const SIMPLE_QUESTIONS: &[&str] = &[
    "what time", "what day", "what date", "how are you", "what's up",
    "who are you", "what's your name", "what is the time",
];

/// Multi-step work indicators (substring match, lowercased).
const COMPLEX_INDICATORS: &[&str] = &[
    "analyze", "compare", "evaluate", "implement", "design", "architecture",
    "trade-off", "tradeoff", "pros and cons", "step by step", "in detail",
    "debug", "refactor", "code review", "write a function", "write code",
    "optimize", "algorithm", "strategy", "comprehensive",
];

/// Deep-reasoning indicators (substring match, lowercased). Stronger
/// than the complex list: these push toward the reasoning tier.
const REASONING_INDICATORS: &[&str] = &[
    "prove", "proof", "theorem", "derive", "derivation", "lemma",
    "by induction", "by contradiction", "from first principles",
    "formal logic", "logic puzzle", "optimal strategy", "game theory",
];

/// Signal-scoring classifier over lexical features of the message.
pub struct HeuristicClassifier {
    /// Below this, an uncertain simple classification is upgraded to
    /// standard (default-up rule).
    confidence_threshold: f32,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self {
            confidence_threshold: 0.4,
        }
    }

    pub fn with_threshold(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    fn length_score(word_count: usize) -> i32 {
        match word_count {
            0..=3 => -2,
            4..=15 => 0,
            16..=50 => 1,
            _ => 2,
        }
    }

    fn count_sentences(text: &str) -> usize {
        let count = text
            .chars()
            .filter(|c| *c == '.' || *c == '?' || *c == '!')
            .count();
        count.max(1)
    }

    /// +1 when at least two of the last three turns ran on the complex
    /// or reasoning tier, so one short follow-up does not drop the
    /// conversation back down.
    fn momentum_score(recent_tiers: &[Tier]) -> i32 {
        let window = recent_tiers.len().min(3);
        let recent = &recent_tiers[recent_tiers.len() - window..];
        let heavy = recent
            .iter()
            .filter(|t| matches!(t, Tier::Complex | Tier::Reasoning))
            .count();
        if heavy >= 2 { 1 } else { 0 }
    }

    fn score_to_tier(score: i32) -> (Tier, f32, &'static str) {
        if score <= -2 {
            let confidence = ((-score) as f32 / 5.0).min(1.0);
            (Tier::Simple, confidence, "simple query indicators")
        } else if score >= 5 {
            let confidence = (score as f32 / 7.0).min(1.0);
            (Tier::Reasoning, confidence, "deep reasoning indicators")
        } else if score >= 2 {
            let confidence = (score as f32 / 5.0).min(1.0);
            (Tier::Complex, confidence, "complex query indicators")
        } else {
            let confidence = 1.0 - (score.unsigned_abs() as f32 / 3.0);
            (Tier::Standard, confidence, "standard complexity")
        }
    }
}

impl TierClassifier for HeuristicClassifier {
    fn classify(&self, input: &ClassifyInput<'_>) -> Classification {
        let trimmed = input.message.trim();
        if trimmed.is_empty() {
            let tier = if input.has_tools {
                Tier::Standard
            } else {
                Tier::Simple
            };
            return Classification {
                tier,
                confidence: 1.0,
                score: 0,
                reason: "empty message",
            };
        }

        let mut score: i32 = 0;
        let lower = trimmed.to_lowercase();

        score += Self::length_score(trimmed.split_whitespace().count());

        if SIMPLE_EXACT.iter().any(|p| lower == *p) {
            score -= 3;
        }
        if SIMPLE_QUESTIONS.iter().any(|q| lower.contains(q)) {
            score -= 2;
        }
        if COMPLEX_INDICATORS.iter().any(|c| lower.contains(c)) {
            score += 2;
        }
        if REASONING_INDICATORS.iter().any(|r| lower.contains(r)) {
            score += 3;
        }
        if trimmed.contains("```") {
            score += 3;
        }
        if Self::count_sentences(trimmed) >= 3 {
            score += 1;
        }
        score += Self::momentum_score(input.recent_tiers);

        let (mut tier, confidence, mut reason) = Self::score_to_tier(score);

        if tier == Tier::Simple && confidence < self.confidence_threshold {
            tier = Tier::Standard;
            reason = "low confidence, defaulting up";
        }
        if tier == Tier::Simple && input.has_tools {
            tier = Tier::Standard;
            reason = "tool definitions floor at standard";
        }

        Classification {
            tier,
            confidence,
            score,
            reason,
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}
