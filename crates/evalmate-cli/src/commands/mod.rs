pub mod evaluate;
pub mod init;
pub mod parse;
pub mod tools;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use evalmate_core::loader::{load_model_answers, load_question_paper};
use evalmate_core::{ModelKeySet, Question};
use evalmate_providers::EvalmateConfig;

/// Load the question paper and model answers, falling back to the
/// configured paths when none are given.
pub(crate) fn load_documents(
    config: &EvalmateConfig,
    questions: Option<&Path>,
    answers: Option<&Path>,
) -> Result<(Vec<Question>, ModelKeySet)> {
    let questions = load_question_paper(questions.unwrap_or(config.question_paper.as_path()))?;
    let model_keys = load_model_answers(answers.unwrap_or(config.model_answers.as_path()))?;
    Ok((questions, model_keys))
}
