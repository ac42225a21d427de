//! Core data model types for evalmate.
//!
//! These are the canonical shapes every loader normalizes into and the
//! engine reads from. Nothing here is mutated after construction.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single exam question with its maximum mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Short stable identifier, e.g. "Q1". Unique within a question set.
    pub id: String,
    /// The question text.
    #[serde(default)]
    pub question: String,
    /// Maximum achievable score.
    pub marks: f64,
}

impl Question {
    pub fn new(id: impl Into<String>, question: impl Into<String>, marks: f64) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            marks,
        }
    }
}

/// Question id → ordered key phrases expected in a correct answer.
///
/// A missing entry and an empty list both mean "no key points to check".
pub type ModelKeySet = IndexMap<String, Vec<String>>;

/// Question id → evaluation, in the order the questions were given.
pub type Evaluations = IndexMap<String, Evaluation>;

/// Question id → teacher-style feedback text.
pub type FeedbackSet = IndexMap<String, String>;

/// The scored outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score rounded to two decimal places.
    pub score: f64,
    /// The question's maximum mark.
    pub out_of: f64,
    /// Key phrases found in the student text, in key order.
    pub matched: Vec<String>,
    /// Key phrases not found, in key order.
    pub missing: Vec<String>,
}

impl Evaluation {
    /// Evaluation for a question that has no key phrases to check.
    pub fn unscored(out_of: f64) -> Self {
        Self {
            score: 0.0,
            out_of,
            matched: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Whether the question had any key phrases at all.
    pub fn has_key_points(&self) -> bool {
        !self.matched.is_empty() || !self.missing.is_empty()
    }

    /// Whether every key phrase was found.
    pub fn is_fully_matched(&self) -> bool {
        self.has_key_points() && self.missing.is_empty()
    }
}
