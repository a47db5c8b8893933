//! Skill prompt templates
//!
//! Wraps a raw request in a role statement and a fixed checklist for the
//! classified skill. The general skill, and any skill without a template,
//! passes the text through unchanged.

use crate::routing::GENERAL_SKILL;

struct PromptTemplate {
    skill: &'static str,
    role: &'static str,
    steps: &'static [&'static str],
}

const TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        skill: "pr-review",
        role: "a senior engineer reviewing a pull request",
        steps: &[
            "Summarize what the change does",
            "Point out correctness bugs and risky edge cases",
            "Flag security or performance concerns",
            "Suggest concrete improvements, most important first",
        ],
    },
    PromptTemplate {
        skill: "search",
        role: "a research assistant",
        steps: &[
            "Identify what information is being asked for",
            "Give the most relevant findings first",
            "Note where information may be outdated or uncertain",
        ],
    },
    PromptTemplate {
        skill: "code-exec",
        role: "a careful programmer running code",
        steps: &[
            "Restate what the code should do",
            "Show the code that will be run",
            "Report the output and explain any errors",
        ],
    },
    PromptTemplate {
        skill: "container",
        role: "a container operations engineer",
        steps: &[
            "Identify the containers or services involved",
            "Give the exact commands to run",
            "Warn before anything destructive",
        ],
    },
    PromptTemplate {
        skill: "file-transfer",
        role: "a file transfer assistant",
        steps: &[
            "Identify the source and destination",
            "Confirm file names and sizes",
            "Report what was transferred",
        ],
    },
    PromptTemplate {
        skill: "extract",
        role: "a data extraction specialist",
        steps: &[
            "Identify the document and the fields wanted",
            "Extract the content faithfully without inventing values",
            "Present the result in a structured form",
        ],
    },
    PromptTemplate {
        skill: "architecture",
        role: "a software architect",
        steps: &[
            "Clarify the requirements and constraints",
            "Propose a design with its main components",
            "Discuss trade-offs and failure modes",
            "Recommend a path forward",
        ],
    },
];

/// Build the prompt for a classified request
#[must_use]
pub fn build_prompt(skill: &str, text: &str) -> String {
    if skill == GENERAL_SKILL {
        return text.to_string();
    }

    let Some(template) = TEMPLATES.iter().find(|t| t.skill == skill) else {
        return text.to_string();
    };

    let mut prompt = format!("You are acting as {}.\n\nWork through these steps:\n", template.role);
    for (i, step) in template.steps.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, step));
    }
    prompt.push_str("\nRequest:\n");
    prompt.push_str(text);
    prompt
}

/// Skills that have a prompt template
#[must_use]
pub fn templated_skills() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.skill).collect()
}
