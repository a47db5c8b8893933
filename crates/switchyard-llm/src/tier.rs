//! Execution tiers
//!
//! A tier is the depth/cost class chosen for a request. Each tier maps to a
//! model name on the backend and carries its own request deadline:
//!
//! | Tier | Model class | Default timeout |
//! |------|-------------|-----------------|
//! | Fast | haiku | 60s |
//! | Deep | sonnet | 180s |
//! | Premium | opus | 300s |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Execution tier for cost/depth selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Quick, cheap answers
    Fast,
    /// Longer reasoning for analysis, code and design work
    Deep,
    /// Most capable model, only reachable through an explicit override
    Premium,
}

impl ModelTier {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Deep => "deep",
            Self::Premium => "premium",
        }
    }

    /// Infer a tier from a backend model name.
    ///
    /// Explicit class names win (`haiku`, `sonnet`, `opus`); otherwise
    /// `flash`/`mini`/`nano` variants are treated as fast and `pro` variants
    /// as deep. Variants are whole name tokens, so `gemini` is not `mini`.
    #[must_use]
    pub fn from_model_name(model: &str) -> Option<Self> {
        let lower = model.to_lowercase();
        if lower.contains("haiku") {
            return Some(Self::Fast);
        } else if lower.contains("sonnet") {
            return Some(Self::Deep);
        } else if lower.contains("opus") {
            return Some(Self::Premium);
        }

        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.iter().any(|t| matches!(*t, "flash" | "mini" | "nano")) {
            Some(Self::Fast)
        } else if tokens.contains(&"pro") {
            Some(Self::Deep)
        } else {
            None
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "haiku" => Ok(Self::Fast),
            "deep" | "sonnet" => Ok(Self::Deep),
            "premium" | "opus" => Ok(Self::Premium),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// Model name used for each tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierModels {
    /// Fast tier model
    #[serde(default = "default_fast_model")]
    pub fast: String,
    /// Deep tier model
    #[serde(default = "default_deep_model")]
    pub deep: String,
    /// Premium tier model
    #[serde(default = "default_premium_model")]
    pub premium: String,
}

fn default_fast_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_deep_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_premium_model() -> String {
    "claude-opus-4-20250514".to_string()
}

impl Default for TierModels {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            deep: default_deep_model(),
            premium: default_premium_model(),
        }
    }
}

impl TierModels {
    /// Model name for a tier
    #[must_use]
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Deep => &self.deep,
            ModelTier::Premium => &self.premium,
        }
    }

    /// Report configured models whose name suggests a different tier.
    ///
    /// Returns `(tier, model, inferred)` for each mismatch. Names that do not
    /// reveal a class are not reported.
    #[must_use]
    pub fn mismatches(&self) -> Vec<(ModelTier, String, ModelTier)> {
        [ModelTier::Fast, ModelTier::Deep, ModelTier::Premium]
            .into_iter()
            .filter_map(|tier| {
                let model = self.model_for(tier);
                match ModelTier::from_model_name(model) {
                    Some(inferred) if inferred != tier => Some((tier, model.to_string(), inferred)),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Request deadline for each tier, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTimeouts {
    /// Fast tier deadline
    #[serde(default = "default_fast_secs")]
    pub fast_secs: u64,
    /// Deep tier deadline
    #[serde(default = "default_deep_secs")]
    pub deep_secs: u64,
    /// Premium tier deadline
    #[serde(default = "default_premium_secs")]
    pub premium_secs: u64,
}

fn default_fast_secs() -> u64 {
    60
}

fn default_deep_secs() -> u64 {
    180
}

fn default_premium_secs() -> u64 {
    300
}

impl Default for TierTimeouts {
    fn default() -> Self {
        Self {
            fast_secs: default_fast_secs(),
            deep_secs: default_deep_secs(),
            premium_secs: default_premium_secs(),
        }
    }
}

impl TierTimeouts {
    /// Deadline for a tier
    #[must_use]
    pub fn for_tier(&self, tier: ModelTier) -> Duration {
        let secs = match tier {
            ModelTier::Fast => self.fast_secs,
            ModelTier::Deep => self.deep_secs,
            ModelTier::Premium => self.premium_secs,
        };
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse() {
        assert_eq!("fast".parse::<ModelTier>().unwrap(), ModelTier::Fast);
        assert_eq!(" Deep ".parse::<ModelTier>().unwrap(), ModelTier::Deep);
        assert_eq!("opus".parse::<ModelTier>().unwrap(), ModelTier::Premium);
        assert!("turbo".parse::<ModelTier>().is_err());
    }

    #[test]
    fn test_from_model_name() {
        assert_eq!(
            ModelTier::from_model_name("claude-3-5-haiku-20241022"),
            Some(ModelTier::Fast)
        );
        assert_eq!(
            ModelTier::from_model_name("gemini-3-flash[1m]"),
            Some(ModelTier::Fast)
        );
        assert_eq!(
            ModelTier::from_model_name("gemini-3-pro-high[1m]"),
            Some(ModelTier::Deep)
        );
        assert_eq!(
            ModelTier::from_model_name("claude-opus-4-20250514"),
            Some(ModelTier::Premium)
        );
        assert_eq!(ModelTier::from_model_name("glm-4.7"), None);
    }

    #[test]
    fn test_variant_tokens_not_substrings() {
        assert_eq!(
            ModelTier::from_model_name("gemini-2.5-pro"),
            Some(ModelTier::Deep)
        );
        assert_eq!(ModelTier::from_model_name("gpt-4o-mini"), Some(ModelTier::Fast));
        assert_eq!(ModelTier::from_model_name("gemini-exp"), None);
        assert_eq!(ModelTier::from_model_name("prompt-model"), None);

        let gemini = TierModels {
            fast: "gemini-3-flash[1m]".to_string(),
            deep: "gemini-3-pro-high[1m]".to_string(),
            ..TierModels::default()
        };
        assert!(gemini.mismatches().is_empty());
    }

    #[test]
    fn test_timeouts_are_graduated() {
        let timeouts = TierTimeouts::default();
        assert!(timeouts.for_tier(ModelTier::Fast) < timeouts.for_tier(ModelTier::Deep));
        assert!(timeouts.for_tier(ModelTier::Deep) < timeouts.for_tier(ModelTier::Premium));
    }

    #[test]
    fn test_default_models_match_their_tier() {
        assert!(TierModels::default().mismatches().is_empty());

        let swapped = TierModels {
            fast: "claude-opus-4-20250514".to_string(),
            ..TierModels::default()
        };
        let mismatches = swapped.mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].0, ModelTier::Fast);
        assert_eq!(mismatches[0].2, ModelTier::Premium);
    }

    #[test]
    fn test_display() {
        assert_eq!(ModelTier::Deep.to_string(), "deep");
    }
}
