//! Binary grading verdict shared by all graders

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-valued grading outcome.
///
/// The meaning depends on the call site: document relevance, answer
/// groundedness (`Irrelevant` means hallucinated) or answer relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Relevant,
    Irrelevant,
}

impl Verdict {
    /// Parse a `yes` / `no` binary score, case-insensitively
    pub fn from_binary_score(score: &str) -> Option<Self> {
        match score.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Relevant),
            "no" => Some(Self::Irrelevant),
            _ => None,
        }
    }

    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant)
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value { Self::Relevant } else { Self::Irrelevant }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Relevant => write!(f, "relevant"),
            Verdict::Irrelevant => write!(f, "irrelevant"),
        }
    }
}
