//! Verbosity-aware response rendering
//!
//! The same stored response can be shown at three levels. Each level only
//! adds to the one below it, so rendered length never decreases from
//! minimal to medium to full.

use crate::metadata::MessageMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters kept at minimal verbosity
const MINIMAL_CHARS: usize = 280;

/// Characters kept at medium verbosity
const MEDIUM_CHARS: usize = 1500;

/// How much of a response is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// First paragraph only
    Minimal,
    /// Body with a short routing footer
    #[default]
    Medium,
    /// Full body with routing details and timing
    Full,
}

impl Verbosity {
    /// All levels, smallest first
    pub const ALL: [Verbosity; 3] = [Verbosity::Minimal, Verbosity::Medium, Verbosity::Full];

    /// Reaction symbol selecting this level
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Minimal => "🤐",
            Self::Medium => "💬",
            Self::Full => "📜",
        }
    }

    /// Level selected by a reaction symbol
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.symbol() == symbol)
    }

    /// Symbols for every other level
    #[must_use]
    pub fn alternatives(&self) -> Vec<&'static str> {
        Self::ALL
            .into_iter()
            .filter(|v| v != self)
            .map(|v| v.symbol())
            .collect()
    }

    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Medium => "medium",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a stored response at a verbosity level
#[must_use]
pub fn render(metadata: &MessageMetadata, verbosity: Verbosity) -> String {
    match verbosity {
        Verbosity::Minimal => minimal_body(&metadata.response),
        Verbosity::Medium => {
            let mut out = clip(&metadata.response, MEDIUM_CHARS);
            out.push_str(&short_footer(metadata));
            out
        }
        Verbosity::Full => {
            let mut out = metadata.response.clone();
            out.push_str(&short_footer(metadata));
            out.push_str(&detail_footer(metadata));
            out
        }
    }
}

fn minimal_body(response: &str) -> String {
    let first = response.split("\n\n").next().unwrap_or_default().trim_end();
    let clipped = clip(first, MINIMAL_CHARS);
    if clipped.chars().count() < response.chars().count() && !clipped.ends_with('…') {
        format!("{clipped} …")
    } else {
        clipped
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn short_footer(metadata: &MessageMetadata) -> String {
    format!("\n\n— {} · {}", metadata.skill(), metadata.tier())
}

fn detail_footer(metadata: &MessageMetadata) -> String {
    let mut out = format!(
        " · confidence {:.2} · complexity {}",
        metadata.classification.confidence, metadata.selection.score
    );
    out.push_str(&format!("\n⏱ {}", metadata.metrics.summary()));
    out
}
