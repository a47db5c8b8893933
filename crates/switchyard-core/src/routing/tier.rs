//! Complexity-based tier selection
//!
//! Additive score over the request text and conversation depth:
//!
//! | Feature | Points |
//! |---------|--------|
//! | Analysis/review indicator | +2 |
//! | Code/refactor indicator | +2 |
//! | Architecture/design indicator | +3 |
//! | Longer than 200 chars | +1 |
//! | Longer than 800 chars | +2 more |
//! | More than 5 prior turns | +1 |
//! | Each trivial lookup phrase | -1 |
//!
//! Each indicator class counts once. The total is floored at zero and compared
//! against the deep threshold (4 by default). Premium is never chosen by
//! scoring; it is only reachable through an explicit override.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use switchyard_llm::ModelTier;

static TRIVIAL_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["what is", "define", "list", "who is", "when is"]
        .iter()
        .map(|phrase| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
                .expect("TRIVIAL_PHRASES are compile-time constants")
        })
        .collect()
});

/// Default score at which a request goes to the deep tier
pub const DEFAULT_DEEP_THRESHOLD: u32 = 4;

/// A class of complexity indicators
#[derive(Debug, Clone)]
struct IndicatorClass {
    name: &'static str,
    weight: i32,
    keywords: &'static [&'static str],
}

const INDICATOR_CLASSES: &[IndicatorClass] = &[
    IndicatorClass {
        name: "analysis",
        weight: 2,
        keywords: &[
            "analyze", "analyse", "analysis", "review", "evaluate", "assess", "audit",
            "compare", "investigate", "explain why",
        ],
    },
    IndicatorClass {
        name: "code",
        weight: 2,
        keywords: &[
            "refactor", "implement", "debug", "algorithm", "optimize", "function", "code",
            "stack trace",
        ],
    },
    IndicatorClass {
        name: "architecture",
        weight: 3,
        keywords: &[
            "architecture", "design", "scalab", "trade-off", "tradeoff", "microservice",
            "distributed",
        ],
    },
];

const LONG_CHARS: usize = 200;
const VERY_LONG_CHARS: usize = 800;
const DEEP_HISTORY_TURNS: usize = 5;

/// Result of tier selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSelection {
    /// Chosen tier
    pub tier: ModelTier,
    /// Complexity score (0 when overridden)
    pub score: u32,
    /// Features that contributed, e.g. `analysis`, `long`, `trivial`
    pub reasons: Vec<String>,
    /// Whether an explicit override decided the tier
    pub overridden: bool,
}

/// Scores requests and picks a tier
#[derive(Debug, Clone)]
pub struct TierSelector {
    deep_threshold: u32,
}

impl Default for TierSelector {
    fn default() -> Self {
        Self::new(DEFAULT_DEEP_THRESHOLD)
    }
}

impl TierSelector {
    /// Create a selector with a deep threshold
    #[must_use]
    pub fn new(deep_threshold: u32) -> Self {
        Self { deep_threshold }
    }

    /// Complexity score and contributing features for a request
    #[must_use]
    pub fn score(&self, text: &str, history_turns: usize) -> (u32, Vec<String>) {
        let lower = text.to_lowercase();
        let mut score: i32 = 0;
        let mut reasons = Vec::new();

        for class in INDICATOR_CLASSES {
            if class.keywords.iter().any(|k| lower.contains(k)) {
                score += class.weight;
                reasons.push(class.name.to_string());
            }
        }

        let length = text.chars().count();
        if length > LONG_CHARS {
            score += 1;
            reasons.push("long".to_string());
        }
        if length > VERY_LONG_CHARS {
            score += 2;
            reasons.push("very_long".to_string());
        }

        if history_turns > DEEP_HISTORY_TURNS {
            score += 1;
            reasons.push("deep_conversation".to_string());
        }

        let trivial = TRIVIAL_PHRASES.iter().filter(|re| re.is_match(text)).count() as i32;
        if trivial > 0 {
            score -= trivial;
            reasons.push("trivial".to_string());
        }

        (score.max(0) as u32, reasons)
    }

    /// Pick a tier. An override bypasses scoring entirely.
    #[must_use]
    pub fn select(
        &self,
        text: &str,
        history_turns: usize,
        override_tier: Option<ModelTier>,
    ) -> TierSelection {
        if let Some(tier) = override_tier {
            return TierSelection {
                tier,
                score: 0,
                reasons: vec!["override".to_string()],
                overridden: true,
            };
        }

        let (score, reasons) = self.score(text, history_turns);
        let tier = if score >= self.deep_threshold {
            ModelTier::Deep
        } else {
            ModelTier::Fast
        };

        TierSelection {
            tier,
            score,
            reasons,
            overridden: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_question_is_fast() {
        let selection = TierSelector::default().select("what is 2+2", 0, None);
        assert_eq!(selection.tier, ModelTier::Fast);
        assert_eq!(selection.score, 0);
        assert!(selection.reasons.contains(&"trivial".to_string()));
    }

    #[test]
    fn test_review_and_architecture_is_deep() {
        let selection = TierSelector::default().select(
            "review this pull request and comment on the architecture",
            0,
            None,
        );
        assert_eq!(selection.tier, ModelTier::Deep);
        assert_eq!(selection.score, 5);
        assert_eq!(selection.reasons, vec!["analysis", "architecture"]);
    }

    #[test]
    fn test_classes_count_once() {
        let selector = TierSelector::default();
        let (once, _) = selector.score("review", 0);
        let (many, _) = selector.score("review audit assess evaluate", 0);
        assert_eq!(once, many);
    }

    #[test]
    fn test_length_and_depth() {
        let selector = TierSelector::default();
        let long = "a".repeat(201);
        assert_eq!(selector.score(&long, 0).0, 1);
        let very_long = "a".repeat(801);
        assert_eq!(selector.score(&very_long, 0).0, 3);
        assert_eq!(selector.score("hello", 6).0, 1);
        assert_eq!(selector.score("hello", 5).0, 0);
    }

    #[test]
    fn test_floored_at_zero() {
        let selector = TierSelector::default();
        let (score, _) = selector.score("what is this, who is that, define it, list them", 0);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_trivial_phrase_needs_word_boundary() {
        let selector = TierSelector::default();
        let (score, reasons) = selector.score("refactor the playlist", 0);
        assert_eq!(score, 2);
        assert!(!reasons.contains(&"trivial".to_string()));
    }

    #[test]
    fn test_monotonic_in_indicators() {
        let selector = TierSelector::default();
        let bases = ["what is x", "hello there", "list the files", ""];
        let additions = [" analyze", " refactor", " design"];
        for base in bases {
            let (before, _) = selector.score(base, 0);
            for addition in additions {
                let (after, _) = selector.score(&format!("{base}{addition}"), 0);
                assert!(after >= before, "{base:?} + {addition:?}");
            }
        }
    }

    #[test]
    fn test_override_bypasses_scoring() {
        let selection = TierSelector::default().select("what is 2+2", 0, Some(ModelTier::Premium));
        assert_eq!(selection.tier, ModelTier::Premium);
        assert!(selection.overridden);
    }

    #[test]
    fn test_custom_threshold() {
        let selector = TierSelector::new(2);
        assert_eq!(selector.select("debug this", 0, None).tier, ModelTier::Deep);
    }
}
