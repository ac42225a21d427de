//! JSON document loaders.
//!
//! Reads the question paper and the model answer key from disk and
//! normalizes each of their accepted shapes into [`Question`]s and a
//! [`ModelKeySet`].
//!
//! Question paper shapes:
//! - `{"questions": [{"id"|"question_id", "question", "marks"}, ...]}`
//! - `{"required": [...]}` with the same element shape
//!
//! Model answer shapes:
//! - `{"model_keys": {"Q1": ["point", ...], ...}}`, used verbatim
//! - `{"answers": [{"id"|"question_id", "solution": {...}}, ...]}`

use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::engine::fold_case;
use crate::error::DocumentError;
use crate::model::{ModelKeySet, Question};

/// Marks assigned to a question that does not state any.
pub const DEFAULT_MARKS: f64 = 10.0;

// ---------------------------------------------------------------------------
// Accepted document shapes
// ---------------------------------------------------------------------------

/// The two accepted top-level shapes of a question paper.
#[derive(Debug)]
enum QuestionPaperDocument {
    Questions(Vec<RawQuestion>),
    Required(Vec<RawQuestion>),
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    question_id: Option<Value>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    marks: Option<Value>,
}

/// The two accepted top-level shapes of a model answer key.
#[derive(Debug)]
enum ModelAnswerDocument {
    Simple(ModelKeySet),
    Detailed(Vec<RawAnswer>),
}

#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    question_id: Option<Value>,
    #[serde(default)]
    solution: Option<RawSolution>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSolution {
    #[serde(default)]
    final_answer: Option<FinalAnswer>,
    #[serde(default)]
    workings: Option<IndexMap<String, Value>>,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FinalAnswer {
    Fields(IndexMap<String, Value>),
    Scalar(Value),
}

impl QuestionPaperDocument {
    fn from_value(value: Value, source_name: &str) -> Result<Self, DocumentError> {
        let mut object = expect_object(value, source_name)?;
        if let Some(list) = object.remove("questions") {
            return Ok(Self::Questions(decode(list, "questions", source_name)?));
        }
        if let Some(list) = object.remove("required") {
            return Ok(Self::Required(decode(list, "required", source_name)?));
        }
        Err(DocumentError::malformed(
            source_name,
            "expected a `questions` or `required` key",
        ))
    }

    fn into_parts(self) -> (&'static str, Vec<RawQuestion>) {
        match self {
            Self::Questions(list) => ("questions", list),
            Self::Required(list) => ("required", list),
        }
    }
}

impl ModelAnswerDocument {
    fn from_value(value: Value, source_name: &str) -> Result<Self, DocumentError> {
        let mut object = expect_object(value, source_name)?;
        if let Some(keys) = object.remove("model_keys") {
            return Ok(Self::Simple(decode(keys, "model_keys", source_name)?));
        }
        if let Some(list) = object.remove("answers") {
            return Ok(Self::Detailed(decode(list, "answers", source_name)?));
        }
        Err(DocumentError::malformed(
            source_name,
            "expected a `model_keys` or `answers` key",
        ))
    }
}

fn expect_object(value: Value, source_name: &str) -> Result<Map<String, Value>, DocumentError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(DocumentError::malformed(
            source_name,
            format!("top-level value must be a JSON object, got {}", kind_of(&other)),
        )),
    }
}

fn decode<T: DeserializeOwned>(
    value: Value,
    key: &str,
    source_name: &str,
) -> Result<T, DocumentError> {
    serde_json::from_value(value)
        .map_err(|e| DocumentError::malformed(source_name, format!("`{key}`: {e}")))
}

fn parse_json(content: &str, source_name: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(content)
        .map_err(|e| DocumentError::malformed(source_name, format!("invalid JSON: {e}")))
}

fn read_document(path: &Path) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Question paper
// ---------------------------------------------------------------------------

/// Load and normalize a question paper JSON file.
pub fn load_question_paper(path: &Path) -> Result<Vec<Question>, DocumentError> {
    let content = read_document(path)?;
    parse_question_paper_str(&content, &path.display().to_string())
}

/// Parse a question paper from a JSON string (useful for testing).
pub fn parse_question_paper_str(
    content: &str,
    source_name: &str,
) -> Result<Vec<Question>, DocumentError> {
    parse_question_paper_value(parse_json(content, source_name)?, source_name)
}

/// Normalize an already-parsed question paper document.
///
/// Each output id is `"Q"` followed by the element's `id`, else its
/// `question_id`, else its 1-based position. Missing text defaults to `""`
/// and missing marks to [`DEFAULT_MARKS`].
pub fn parse_question_paper_value(
    value: Value,
    source_name: &str,
) -> Result<Vec<Question>, DocumentError> {
    let (key, raw_questions) = QuestionPaperDocument::from_value(value, source_name)?.into_parts();

    let mut questions = Vec::with_capacity(raw_questions.len());
    for (index, raw) in raw_questions.into_iter().enumerate() {
        let entry = format!("{key}[{index}]");

        let label = match raw.id.as_ref().or(raw.question_id.as_ref()) {
            Some(value) => id_label(value).ok_or_else(|| {
                DocumentError::validation(
                    &entry,
                    format!("id must be a string or number, got {}", kind_of(value)),
                )
            })?,
            None => (questions.len() + 1).to_string(),
        };

        let marks = match &raw.marks {
            None => DEFAULT_MARKS,
            Some(value) => value.as_f64().ok_or_else(|| {
                DocumentError::validation(
                    &entry,
                    format!("marks must be a number, got {}", kind_of(value)),
                )
            })?,
        };

        questions.push(Question {
            id: format!("Q{label}"),
            question: raw.question.unwrap_or_default(),
            marks,
        });
    }

    tracing::debug!(
        source = source_name,
        shape = key,
        count = questions.len(),
        "loaded question paper"
    );

    Ok(questions)
}

/// Render questions as a `{"questions": [...]}` document that loads back
/// into the same questions.
///
/// The `Q` prefix the loader adds is stripped from each id.
pub fn question_paper_document(questions: &[Question]) -> Value {
    let entries: Vec<Value> = questions
        .iter()
        .map(|q| {
            json!({
                "id": q.id.strip_prefix('Q').unwrap_or(&q.id),
                "question": q.question,
                "marks": q.marks,
            })
        })
        .collect();
    json!({ "questions": entries })
}

// ---------------------------------------------------------------------------
// Model answers
// ---------------------------------------------------------------------------

/// Load and normalize a model answer JSON file.
pub fn load_model_answers(path: &Path) -> Result<ModelKeySet, DocumentError> {
    let content = read_document(path)?;
    parse_model_answers_str(&content, &path.display().to_string())
}

/// Parse a model answer key from a JSON string (useful for testing).
pub fn parse_model_answers_str(
    content: &str,
    source_name: &str,
) -> Result<ModelKeySet, DocumentError> {
    parse_model_answers_value(parse_json(content, source_name)?, source_name)
}

/// Normalize an already-parsed model answer document.
///
/// The simple shape is returned as-is. For detailed answers the key points
/// are, in order and lower-cased: the final answer (every truthy value of a
/// mapping, or the scalar itself), each scalar working as `"<key>: <value>"`,
/// then the method.
pub fn parse_model_answers_value(
    value: Value,
    source_name: &str,
) -> Result<ModelKeySet, DocumentError> {
    let answers = match ModelAnswerDocument::from_value(value, source_name)? {
        ModelAnswerDocument::Simple(model_keys) => {
            tracing::debug!(
                source = source_name,
                count = model_keys.len(),
                "loaded model keys"
            );
            return Ok(model_keys);
        }
        ModelAnswerDocument::Detailed(answers) => answers,
    };

    let mut model_keys = ModelKeySet::with_capacity(answers.len());
    for (index, answer) in answers.into_iter().enumerate() {
        let label = match answer.id.as_ref().or(answer.question_id.as_ref()) {
            Some(value) => id_label(value).ok_or_else(|| {
                DocumentError::validation(
                    format!("answers[{index}]"),
                    format!("id must be a string or number, got {}", kind_of(value)),
                )
            })?,
            None => String::new(),
        };

        let key_points = key_points(answer.solution.unwrap_or_default());
        model_keys.insert(format!("Q{label}"), key_points);
    }

    tracing::debug!(
        source = source_name,
        count = model_keys.len(),
        "loaded detailed model answers"
    );

    Ok(model_keys)
}

fn key_points(solution: RawSolution) -> Vec<String> {
    let mut points = Vec::new();

    match solution.final_answer {
        Some(FinalAnswer::Fields(fields)) => points.extend(
            fields
                .values()
                .filter(|v| is_truthy(v))
                .map(|v| fold_case(&stringify(v))),
        ),
        Some(FinalAnswer::Scalar(Value::Null)) | None => {}
        Some(FinalAnswer::Scalar(value)) => points.push(fold_case(&stringify(&value))),
    }

    for (key, value) in solution.workings.unwrap_or_default() {
        if matches!(value, Value::Null | Value::Array(_) | Value::Object(_)) {
            continue;
        }
        points.push(fold_case(&format!("{key}: {}", stringify(&value))));
    }

    if let Some(method) = solution.method.filter(|m| !m.is_empty()) {
        points.push(fold_case(&method));
    }

    points
}

fn id_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
