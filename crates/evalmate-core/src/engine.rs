//! The answer evaluation engine.
//!
//! Scores free-form student text against per-question key phrases by
//! case-insensitive substring search. Pure and synchronous: no I/O, no
//! shared state, safe to call from any number of threads at once.

use std::collections::HashSet;

use crate::error::DocumentError;
use crate::model::{Evaluation, Evaluations, ModelKeySet, Question};

/// Evaluate `student_text` against the key phrases of every question.
///
/// Questions without an entry in `model_keys`, or with an empty list, score
/// zero with empty `matched`/`missing`. Matching is substring based, so a
/// key phrase "act" is found inside "reaction".
pub fn evaluate(
    questions: &[Question],
    model_keys: &ModelKeySet,
    student_text: &str,
) -> Evaluations {
    let haystack = fold_case(student_text);
    let mut evaluations = Evaluations::with_capacity(questions.len());

    for question in questions {
        let evaluation = match model_keys.get(&question.id) {
            Some(keys) if !keys.is_empty() => score_question(question.marks, keys, &haystack),
            _ => Evaluation::unscored(question.marks),
        };

        tracing::debug!(
            question = %question.id,
            score = evaluation.score,
            out_of = evaluation.out_of,
            matched = evaluation.matched.len(),
            missing = evaluation.missing.len(),
            "scored question"
        );

        evaluations.insert(question.id.clone(), evaluation);
    }

    evaluations
}

/// Like [`evaluate`], but rejects malformed questions before scoring.
///
/// Fails on the first question with an empty id, a duplicate id, or marks
/// that are negative or not finite.
pub fn evaluate_strict(
    questions: &[Question],
    model_keys: &ModelKeySet,
    student_text: &str,
) -> Result<Evaluations, DocumentError> {
    check_questions(questions)?;
    Ok(evaluate(questions, model_keys, student_text))
}

/// Reject empty or duplicate ids and negative or non-finite marks.
pub(crate) fn check_questions(questions: &[Question]) -> Result<(), DocumentError> {
    let mut seen = HashSet::new();
    for (index, question) in questions.iter().enumerate() {
        if question.id.trim().is_empty() {
            return Err(DocumentError::validation(
                format!("questions[{index}]"),
                "question id is empty",
            ));
        }
        if !seen.insert(question.id.as_str()) {
            return Err(DocumentError::validation(&question.id, "duplicate question id"));
        }
        if !question.marks.is_finite() || question.marks < 0.0 {
            return Err(DocumentError::validation(
                &question.id,
                format!(
                    "marks must be a finite non-negative number, got {}",
                    question.marks
                ),
            ));
        }
    }
    Ok(())
}

/// Lowercase one character at a time.
///
/// `str::to_lowercase` maps a word-final capital sigma to `ς`, so the same
/// phrase could fold differently inside the student text than on its own.
pub(crate) fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

fn score_question(marks: f64, keys: &[String], haystack: &str) -> Evaluation {
    let matched: Vec<String> = keys
        .iter()
        .filter(|key| !key.is_empty() && haystack.contains(&fold_case(key)))
        .cloned()
        .collect();

    // Exclusion is by value: an identical phrase elsewhere in the list is
    // matched too.
    let missing: Vec<String> = keys
        .iter()
        .filter(|key| !matched.contains(key))
        .cloned()
        .collect();

    // One division, so an exact half hundredth is not nudged below .5
    let hundredths = marks * matched.len() as f64 * 100.0 / keys.len() as f64;

    Evaluation {
        score: hundredths.round() / 100.0,
        out_of: marks,
        matched,
        missing,
    }
}

/// Round to two decimal places, halves away from zero.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A non-fatal issue found when checking engine inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check questions and key phrases for issues that do not stop evaluation
/// but usually indicate a bad document.
pub fn validate_inputs(
    questions: &[Question],
    model_keys: &ModelKeySet,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for question in questions {
        if !seen_ids.insert(question.id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in questions {
        let has_keys = model_keys
            .get(&question.id)
            .is_some_and(|keys| !keys.is_empty());
        if !has_keys {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "no key points; this question always scores 0".into(),
            });
        }
    }

    for (id, keys) in model_keys {
        if !seen_ids.contains(id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(id.clone()),
                message: "key points given for a question that is not on the paper".into(),
            });
        }
        let empty = keys.iter().filter(|k| k.is_empty()).count();
        if empty > 0 {
            warnings.push(ValidationWarning {
                question_id: Some(id.clone()),
                message: format!("{empty} empty key point(s) can never match"),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photosynthesis() -> Vec<Question> {
        vec![Question::new("Q1", "Explain photosynthesis", 10.0)]
    }

    fn keys(entries: &[(&str, &[&str])]) -> ModelKeySet {
        entries
            .iter()
            .map(|(id, phrases)| {
                (
                    id.to_string(),
                    phrases.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn photosynthesis_half_marks() {
        let model_keys = keys(&[(
            "Q1",
            &["chlorophyll", "carbon dioxide", "glucose", "oxygen"],
        )]);
        let evals = evaluate(
            &photosynthesis(),
            &model_keys,
            "Plants use chlorophyll and water to make glucose.",
        );

        let q1 = &evals["Q1"];
        assert_eq!(q1.matched, vec!["chlorophyll", "glucose"]);
        assert_eq!(q1.missing, vec!["carbon dioxide", "oxygen"]);
        assert_eq!(q1.score, 5.0);
        assert_eq!(q1.out_of, 10.0);
    }

    #[test]
    fn missing_entry_scores_zero() {
        let evals = evaluate(&photosynthesis(), &ModelKeySet::new(), "chlorophyll everywhere");
        assert_eq!(evals["Q1"], Evaluation::unscored(10.0));
    }

    #[test]
    fn empty_key_list_scores_zero_even_with_text() {
        let model_keys = keys(&[("Q1", &[])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "anything at all");
        let q1 = &evals["Q1"];
        assert_eq!(q1.score, 0.0);
        assert!(q1.matched.is_empty());
        assert!(q1.missing.is_empty());
    }

    #[test]
    fn empty_questions_give_empty_result() {
        let evals = evaluate(&[], &keys(&[("Q1", &["x"])]), "x");
        assert!(evals.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let model_keys = keys(&[("Q1", &["Glucose"])]);
        for text in ["made of glucose", "MADE OF GLUCOSE", "GlUcOsE"] {
            let evals = evaluate(&photosynthesis(), &model_keys, text);
            assert_eq!(evals["Q1"].matched, vec!["Glucose"], "text: {text}");
            assert_eq!(evals["Q1"].score, 10.0);
        }
    }

    #[test]
    fn matching_is_substring_not_word() {
        let model_keys = keys(&[("Q1", &["act"])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "an equal and opposite reaction");
        assert_eq!(evals["Q1"].matched, vec!["act"]);
    }

    #[test]
    fn empty_phrase_never_matches_but_counts() {
        let model_keys = keys(&[("Q1", &["glucose", ""])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "glucose");
        let q1 = &evals["Q1"];
        assert_eq!(q1.matched, vec!["glucose"]);
        assert_eq!(q1.missing, vec![""]);
        assert_eq!(q1.score, 5.0);
    }

    #[test]
    fn empty_student_text_scores_zero() {
        let model_keys = keys(&[("Q1", &["glucose", "oxygen"])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "");
        assert_eq!(evals["Q1"].score, 0.0);
        assert_eq!(evals["Q1"].missing, vec!["glucose", "oxygen"]);
    }

    #[test]
    fn duplicate_phrases_excluded_by_value() {
        let model_keys = keys(&[("Q1", &["oxygen", "water", "oxygen"])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "releases oxygen");
        let q1 = &evals["Q1"];
        assert_eq!(q1.matched, vec!["oxygen", "oxygen"]);
        assert_eq!(q1.missing, vec!["water"]);
        assert_eq!(q1.score, 6.67);
    }

    #[test]
    fn matched_and_missing_partition_keys() {
        let phrases = ["alpha", "beta", "gamma", "delta", "epsilon"];
        let model_keys = keys(&[("Q1", &phrases)]);
        let evals = evaluate(&photosynthesis(), &model_keys, "beta then delta, Epsilon");
        let q1 = &evals["Q1"];
        assert_eq!(q1.matched.len() + q1.missing.len(), phrases.len());
        for phrase in phrases {
            assert!(
                q1.matched.contains(&phrase.to_string()) ^ q1.missing.contains(&phrase.to_string())
            );
        }
        assert_eq!(q1.score, round_to_hundredths(10.0 * 3.0 / 5.0));
    }

    #[test]
    fn rounding_at_half_hundredth() {
        // (marks, matched of 8 keys, expected)
        let cases = [
            (1.0, 1, 0.13),
            (1.0, 3, 0.38),
            (1.0, 5, 0.63),
            (1.0, 7, 0.88),
            (0.5, 2, 0.13),
            (3.0, 1, 0.38),
        ];
        let all: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
        for (marks, hits, expected) in cases {
            let text = all[..hits].join(" ");
            let mut model_keys = ModelKeySet::new();
            model_keys.insert("Q1".into(), all.clone());
            let evals = evaluate(&[Question::new("Q1", "", marks)], &model_keys, &text);
            assert_eq!(
                evals["Q1"].score, expected,
                "marks={marks} hits={hits}/8"
            );
        }
    }

    #[test]
    fn rounding_half_hundredths_not_exact_in_binary() {
        // (marks, matched of 40 keys, expected)
        let cases = [(1.0, 23, 0.58), (3.0, 17, 1.28), (1.0, 5, 0.13), (7.0, 9, 1.58)];
        let all: Vec<String> = (0..40).map(|i| format!("key{i:02}")).collect();
        for (marks, hits, expected) in cases {
            let text = all[..hits].join(" ");
            let mut model_keys = ModelKeySet::new();
            model_keys.insert("Q1".into(), all.clone());
            let evals = evaluate(&[Question::new("Q1", "", marks)], &model_keys, &text);
            assert_eq!(
                evals["Q1"].score, expected,
                "marks={marks} hits={hits}/40"
            );
        }
    }

    #[test]
    fn final_sigma_matches_inside_a_word() {
        let model_keys = keys(&[("Q1", &["ΟΔΟΣ"])]);
        let evals = evaluate(&photosynthesis(), &model_keys, "ΟΔΟΣΑ");
        assert_eq!(evals["Q1"].matched, vec!["ΟΔΟΣ"]);
        assert!(evals["Q1"].missing.is_empty());

        let evals = evaluate(&photosynthesis(), &model_keys, "η οδοσ");
        assert_eq!(evals["Q1"].score, 10.0);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let questions = vec![
            Question::new("Q1", "a", 10.0),
            Question::new("Q2", "b", 7.0),
        ];
        let model_keys = keys(&[("Q2", &["force", "mass"]), ("Q1", &["inertia"])]);
        let text = "Force equals mass times acceleration";
        let first = serde_json::to_string(&evaluate(&questions, &model_keys, text)).unwrap();
        let second = serde_json::to_string(&evaluate(&questions, &model_keys, text)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_follows_question_order_not_key_order() {
        let questions = vec![
            Question::new("Q2", "", 5.0),
            Question::new("Q1", "", 5.0),
        ];
        let forward = keys(&[("Q1", &["a"]), ("Q2", &["b"])]);
        let reverse = keys(&[("Q2", &["b"]), ("Q1", &["a"])]);
        let a = evaluate(&questions, &forward, "a b");
        let b = evaluate(&questions, &reverse, "a b");
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["Q2", "Q1"]);
    }

    #[test]
    fn marks_propagate_unvalidated() {
        let questions = vec![Question::new("Q1", "", -4.0)];
        let evals = evaluate(&questions, &keys(&[("Q1", &["x", "y"])]), "x");
        assert_eq!(evals["Q1"].out_of, -4.0);
        assert_eq!(evals["Q1"].score, -2.0);
    }

    #[test]
    fn strict_rejects_bad_marks() {
        let questions = vec![Question::new("Q3", "", f64::NAN)];
        let err = evaluate_strict(&questions, &ModelKeySet::new(), "").unwrap_err();
        match err {
            DocumentError::Validation { entry, .. } => assert_eq!(entry, "Q3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_rejects_empty_and_duplicate_ids() {
        let empty = vec![Question::new("", "", 1.0)];
        assert!(evaluate_strict(&empty, &ModelKeySet::new(), "").is_err());

        let dupes = vec![Question::new("Q1", "", 1.0), Question::new("Q1", "", 2.0)];
        let err = evaluate_strict(&dupes, &ModelKeySet::new(), "").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn strict_accepts_well_formed_input() {
        let model_keys = keys(&[("Q1", &["glucose"])]);
        let evals = evaluate_strict(&photosynthesis(), &model_keys, "glucose").unwrap();
        assert_eq!(evals["Q1"].score, 10.0);
    }

    #[test]
    fn warnings_cover_common_mistakes() {
        let questions = vec![
            Question::new("Q1", "", 5.0),
            Question::new("Q1", "", 5.0),
            Question::new("Q2", "", 5.0),
        ];
        let model_keys = keys(&[("Q1", &["x", ""]), ("Q9", &["y"])]);
        let warnings = validate_inputs(&questions, &model_keys);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("always scores 0")));
        assert!(messages.iter().any(|m| m.contains("not on the paper")));
        assert!(messages.iter().any(|m| m.contains("can never match")));
    }
}
