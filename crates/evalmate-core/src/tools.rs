//! Tool catalog exposed to an LLM-driven agent.
//!
//! Only `evaluate_answers` runs locally; the other tools are implemented by
//! collaborators and are described here so an agent framework can register
//! them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine::evaluate;
use crate::error::DocumentError;
use crate::model::{Evaluations, ModelKeySet, Question};

/// Description of one tool the agent may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub purpose: String,
    pub input_schema: Value,
    pub output_schema: Value,
    pub developer_notes: Vec<String>,
}

impl ToolSchema {
    fn new(
        name: &str,
        description: &str,
        purpose: &str,
        input_schema: Value,
        output_schema: Value,
        developer_notes: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            purpose: purpose.into(),
            input_schema,
            output_schema,
            developer_notes: developer_notes.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// The full tool catalog, in pipeline order.
pub fn tool_definitions() -> Vec<ToolSchema> {
    vec![
        ToolSchema::new(
            "parse_question_paper",
            "Parses the entire question paper and extracts all questions.",
            "Convert a question paper into structured {id, question, marks} entries.",
            json!({"text": "string"}),
            json!({"questions": [{"id": "Q1", "question": "string", "marks": 5}]}),
            &["LLM-driven: return whatever the agent generates."],
        ),
        ToolSchema::new(
            "parse_model_answer",
            "Extracts key points for each question from the model answer document.",
            "Turn model answers into bullet points for comparison.",
            json!({"text": "string"}),
            json!({"model_keys": {"Q1": ["point1", "point2"]}}),
            &[
                "LLM handles the extraction.",
                "No additional computation required.",
            ],
        ),
        ToolSchema::new(
            "evaluate_answers",
            "Compares student answers with model key points and assigns scoring plus missing points.",
            "Deterministic scoring logic.",
            json!({"questions": [], "model_keys": {}, "student_text": "string"}),
            json!({"evaluations": {"Q1": {"score": 0, "out_of": 0, "matched": [], "missing": []}}}),
            &[
                "Match key phrases by simple substring search.",
                "Score = (matched keys / total keys) x marks.",
                "Do not use an LLM here.",
            ],
        ),
        ToolSchema::new(
            "generate_feedback",
            "Produces teacher-style feedback for each question based on the evaluation results.",
            "Improve student learning with natural-language feedback.",
            json!({"evaluations": {}}),
            json!({"feedback": {"Q1": "string"}}),
            &[
                "LLM generates the feedback.",
                "Always return one entry per question.",
            ],
        ),
        ToolSchema::new(
            "generate_audio_feedback",
            "Converts feedback text into spoken audio using the ElevenLabs API.",
            "Provide optional audio teacher feedback.",
            json!({"text": "string", "voice": "string"}),
            json!({"audio_url": "string"}),
            &[
                "Use ElevenLabs TTS. Default voice is \"default\" when unspecified.",
                "Return a URL where the audio file is hosted.",
            ],
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct ModelKeysPayload {
    #[serde(default)]
    model_keys: ModelKeySet,
}

#[derive(Debug, Serialize)]
struct EvaluationsPayload<'a> {
    evaluations: &'a Evaluations,
}

/// Run `evaluate_answers` across a JSON boundary.
///
/// Takes `{"questions": [...]}` and `{"model_keys": {...}}` documents in the
/// canonical shapes and returns `{"evaluations": {...}}` as pretty JSON. A
/// missing top-level key counts as empty.
pub fn evaluate_tool_call(
    questions_json: &str,
    model_keys_json: &str,
    student_text: &str,
) -> Result<String, DocumentError> {
    let questions: QuestionsPayload = serde_json::from_str(questions_json)
        .map_err(|e| DocumentError::malformed("questions_json", e.to_string()))?;
    let model_keys: ModelKeysPayload = serde_json::from_str(model_keys_json)
        .map_err(|e| DocumentError::malformed("model_keys_json", e.to_string()))?;

    let evaluations = evaluate(&questions.questions, &model_keys.model_keys, student_text);

    serde_json::to_string_pretty(&EvaluationsPayload {
        evaluations: &evaluations,
    })
    .map_err(|e| DocumentError::malformed("evaluations", e.to_string()))
}

/// Render questions as the `parse_question_paper` tool output.
pub fn questions_tool_output(questions: &[Question]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({ "questions": questions }))
}

/// Render key phrases as the `parse_model_answer` tool output.
pub fn model_keys_tool_output(model_keys: &ModelKeySet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({ "model_keys": model_keys }))
}
