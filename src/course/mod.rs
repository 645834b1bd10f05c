//! Course document model.
//!
//! The structured output of a generation run: extracted from free-form model
//! text by [`extract::extract_json`] and coerced into these types by
//! [`normalize::normalize`].

pub mod extract;
pub mod normalize;

pub use extract::extract_json;
pub use normalize::normalize;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LaereError, Result};

/// Course difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = LaereError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(LaereError::Config(format!(
                "Unknown difficulty: {s}. Valid options: beginner, intermediate, advanced"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "Beginner"),
            Self::Intermediate => write!(f, "Intermediate"),
            Self::Advanced => write!(f, "Advanced"),
        }
    }
}

/// A complete generated course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDocument {
    /// Course title.
    pub title: String,
    /// Short course description.
    #[serde(default)]
    pub description: String,
    /// Difficulty level.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Estimated total duration in hours (0 when unknown).
    #[serde(default)]
    pub estimated_duration: u32,
    /// What the learner will be able to do afterwards.
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    /// Skills practiced across the course.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Ordered course modules.
    pub modules: Vec<Module>,
    /// URIs of the sources the content draws from.
    #[serde(default)]
    pub source_from: Vec<String>,
    /// Per-origin provenance summary, attached after generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tracking: Option<SourceTracking>,
}

/// One module of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module title.
    pub title: String,
    /// 1-based position within the course.
    pub index: u32,
    /// Ordered lessons; never empty after normalization.
    pub lessons: Vec<Lesson>,
    /// Module quiz; items with inconsistent answers are dropped.
    #[serde(default)]
    pub quiz: Vec<QuizItem>,
}

/// One lesson within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson title.
    pub title: String,
    /// 1-based position within the module.
    pub index: u32,
    /// Lesson body, markdown.
    #[serde(default)]
    pub content: String,
}

/// A single multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Question text.
    pub question: String,
    /// Choice label (e.g. "A") to choice text.
    pub choices: BTreeMap<String, String>,
    /// Label of the correct choice; always a key of `choices`.
    pub answer: String,
}

/// Counts and aggregate confidence of the sources behind a course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceTracking {
    /// Sources from the internal knowledge base.
    pub internal_count: usize,
    /// Sources from repository search.
    pub repository_count: usize,
    /// Sources from web search.
    pub web_count: usize,
    /// Mean relevance across all tracked sources, in [0, 1].
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(
            "beginner".parse::<Difficulty>().unwrap(),
            Difficulty::Beginner
        );
        assert_eq!(
            "Intermediate".parse::<Difficulty>().unwrap(),
            Difficulty::Intermediate
        );
        assert_eq!(
            "ADVANCED".parse::<Difficulty>().unwrap(),
            Difficulty::Advanced
        );
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_difficulty_serializes_capitalized() {
        let json = serde_json::to_string(&Difficulty::Beginner).unwrap();
        assert_eq!(json, "\"Beginner\"");
        assert_eq!(Difficulty::Advanced.to_string(), "Advanced");
    }
}
