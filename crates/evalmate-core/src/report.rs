//! Evaluation report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::round_to_hundredths;
use crate::model::{Evaluations, FeedbackSet, Question};
use crate::traits::AudioFeedback;

/// A complete evaluation of one student submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Where the student text came from.
    pub submission: SubmissionSummary,
    /// The questions that were evaluated.
    pub questions: Vec<Question>,
    /// Per-question evaluations, in question order.
    pub evaluations: Evaluations,
    /// Per-question feedback, when requested.
    #[serde(default)]
    pub feedback: Option<FeedbackSet>,
    /// Per-question audio feedback, when requested.
    #[serde(default)]
    pub audio: IndexMap<String, AudioFeedback>,
    /// Totals across all questions.
    pub summary: ReportSummary,
    /// Time spent in each stage.
    pub timing: StageTiming,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of the student submission (without the full text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSummary {
    /// File name or "inline".
    pub source: String,
    /// Length of the student text in characters.
    pub characters: usize,
}

/// Milliseconds spent per pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTiming {
    pub extraction_ms: u64,
    pub evaluation_ms: u64,
    pub feedback_ms: u64,
    pub audio_ms: u64,
}

/// Totals across every evaluated question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_score: f64,
    pub total_out_of: f64,
    /// Total score as a percentage of total marks.
    pub percentage: f64,
    pub question_count: usize,
    /// Questions where every key phrase was found.
    pub fully_matched: usize,
    /// Questions that had no key phrases to check.
    pub unscored: usize,
    pub key_points_matched: usize,
    pub key_points_total: usize,
}

impl ReportSummary {
    pub fn compute(evaluations: &Evaluations) -> Self {
        let total_score: f64 = evaluations.values().map(|e| e.score).sum();
        let total_out_of: f64 = evaluations.values().map(|e| e.out_of).sum();
        let percentage = if total_out_of > 0.0 {
            round_to_hundredths(total_score / total_out_of * 100.0)
        } else {
            0.0
        };

        Self {
            total_score: round_to_hundredths(total_score),
            total_out_of: round_to_hundredths(total_out_of),
            percentage,
            question_count: evaluations.len(),
            fully_matched: evaluations.values().filter(|e| e.is_fully_matched()).count(),
            unscored: evaluations.values().filter(|e| !e.has_key_points()).count(),
            key_points_matched: evaluations.values().map(|e| e.matched.len()).sum(),
            key_points_total: evaluations
                .values()
                .map(|e| e.matched.len() + e.missing.len())
                .sum(),
        }
    }
}

impl EvaluationReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}
