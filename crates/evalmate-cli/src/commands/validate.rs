//! The `evalmate validate` command.

use std::path::PathBuf;

use anyhow::Result;

use evalmate_core::engine::{evaluate_strict, validate_inputs};
use evalmate_providers::load_config_from;

use super::load_documents;

pub fn execute(
    questions: Option<PathBuf>,
    answers: Option<PathBuf>,
    strict: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (questions, model_keys) =
        load_documents(&config, questions.as_deref(), answers.as_deref())?;

    let key_points: usize = model_keys.values().map(Vec::len).sum();
    let total_marks: f64 = questions.iter().map(|q| q.marks).sum();
    println!(
        "Question paper: {} questions, {total_marks} marks",
        questions.len()
    );
    println!(
        "Model answers: {} questions, {key_points} key points",
        model_keys.len()
    );

    if strict {
        // Scoring empty text runs every structural check without a submission
        evaluate_strict(&questions, &model_keys, "")?;
    }

    let warnings = validate_inputs(&questions, &model_keys);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Documents valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
