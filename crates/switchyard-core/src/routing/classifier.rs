//! Keyword intent classifier
//!
//! Scores request text against a table of skills, each with trigger keywords.
//!
//! | Match | Score |
//! |-------|-------|
//! | Distinct keyword found (case-insensitive substring) | 1.0 |
//! | Each extra occurrence of a matched keyword (max 3) | 0.25 |
//!
//! The skill with the strictly highest total wins; ties go to the skill
//! registered first. A best score of zero resolves to [`GENERAL_SKILL`].

use serde::{Deserialize, Serialize};

/// Skill id used when nothing matches
pub const GENERAL_SKILL: &str = "general";

/// Bonus per repeated occurrence of an already-matched keyword
const REPEAT_BONUS: f32 = 0.25;

/// Repeated occurrences that earn a bonus, per keyword
const MAX_REPEATS: usize = 3;

/// A skill and its trigger keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Skill id
    pub id: String,
    /// Lowercased, deduplicated trigger keywords
    pub keywords: Vec<String>,
}

/// Result of classifying one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Winning skill id
    pub skill: String,
    /// Cumulative score of the winner
    pub confidence: f32,
    /// Keywords of the winner that matched
    pub matched_keywords: Vec<String>,
}

impl Classification {
    fn general() -> Self {
        Self {
            skill: GENERAL_SKILL.to_string(),
            confidence: 0.0,
            matched_keywords: Vec::new(),
        }
    }

    /// Whether no skill matched
    #[must_use]
    pub fn is_general(&self) -> bool {
        self.skill == GENERAL_SKILL
    }
}

/// Ordered keyword table
#[derive(Debug, Clone, Default)]
pub struct SkillTable {
    skills: Vec<SkillDefinition>,
}

impl SkillTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. Registration order is the tie-break order.
    ///
    /// Re-registering an id replaces its keywords but keeps its position.
    #[must_use]
    pub fn with_skill<I, S>(mut self, id: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = id.into();
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        match self.skills.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.keywords = normalized,
            None => self.skills.push(SkillDefinition {
                id,
                keywords: normalized,
            }),
        }
        self
    }

    /// The built-in table
    #[must_use]
    pub fn default_table() -> Self {
        Self::new()
            .with_skill(
                "pr-review",
                ["pull request", "review", "diff", "merge request", "pr #", "code review"],
            )
            .with_skill(
                "search",
                ["search", "look up", "lookup", "google", "latest news", "find info"],
            )
            .with_skill(
                "code-exec",
                ["run this", "execute", "python", "script", "compile", "run code"],
            )
            .with_skill(
                "container",
                ["docker", "container", "kubernetes", "k8s", "compose", "pod"],
            )
            .with_skill(
                "file-transfer",
                ["upload", "download", "send file", "transfer", "attachment"],
            )
            .with_skill(
                "extract",
                ["extract", "parse", "pdf", "scrape", "ocr", "transcribe"],
            )
            .with_skill(
                "architecture",
                ["architecture", "system design", "scalability", "microservice", "diagram"],
            )
    }

    /// Registered skills in registration order
    #[must_use]
    pub fn skills(&self) -> &[SkillDefinition] {
        &self.skills
    }

    /// Whether a skill id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.skills.iter().any(|s| s.id == id)
    }

    /// Classify a request
    #[must_use]
    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        let mut best: Option<(usize, f32, Vec<String>)> = None;

        for (index, skill) in self.skills.iter().enumerate() {
            let (score, matched) = score_skill(skill, &lower);
            let better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => score > 0.0,
            };
            if better {
                best = Some((index, score, matched));
            }
        }

        match best {
            Some((index, score, matched)) => Classification {
                skill: self.skills[index].id.clone(),
                confidence: score,
                matched_keywords: matched,
            },
            None => Classification::general(),
        }
    }
}

fn score_skill(skill: &SkillDefinition, lower_text: &str) -> (f32, Vec<String>) {
    let mut score = 0.0;
    let mut matched = Vec::new();

    for keyword in &skill.keywords {
        let occurrences = lower_text.matches(keyword.as_str()).count();
        if occurrences == 0 {
            continue;
        }
        let repeats = (occurrences - 1).min(MAX_REPEATS);
        score += 1.0 + REPEAT_BONUS * repeats as f32;
        matched.push(keyword.clone());
    }

    (score, matched)
}
