//! OpenAI chat-completions reasoning agent.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use evalmate_core::loader::{parse_model_answers_str, parse_question_paper_str};
use evalmate_core::traits::{extract_json_from_markdown, ReasoningAgent};
use evalmate_core::{DocumentError, Evaluations, FeedbackSet, ModelKeySet, Question, ServiceError};

use crate::http::{build_client, check_status, send_error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-5.1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

const QUESTION_PAPER_PROMPT: &str = "You parse exam question papers. Return a JSON object of the form \
{\"questions\": [{\"id\": 1, \"question\": \"...\", \"marks\": 5}]} using the question numbers \
printed on the paper as ids. Omit marks the paper does not state. Return JSON only.";

const MODEL_ANSWER_PROMPT: &str = "You extract marking key points from model answers. Return a JSON \
object of the form {\"model_keys\": {\"Q1\": [\"point1\", \"point2\"]}}. Each point is a short, \
lower-case phrase a correct student answer would contain verbatim. Return JSON only.";

const FEEDBACK_PROMPT: &str = "You are a supportive teacher. For every question in the evaluation \
results, write two or three sentences of feedback: acknowledge what the student covered and explain \
what was missing. Return a JSON object of the form {\"feedback\": {\"Q1\": \"...\"}} with one entry \
per question. Return JSON only.";

/// Reasoning agent backed by an OpenAI-compatible chat completions API.
pub struct OpenAiAgent {
    api_key: String,
    base_url: String,
    model: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiAgent {
    pub fn new(
        api_key: &str,
        model: Option<String>,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            org_id,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the JSON payload of the reply.
    async fn complete(&self, system: &str, user: String) -> Result<String, ServiceError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: json!({"type": "json_object"}),
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse("reply has no content".into()))?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "agent replied"
        );

        Ok(extract_json_from_markdown(&content))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackReply {
    feedback: FeedbackSet,
}

const REPLY_SOURCE: &str = "agent reply";

fn invalid_document(error: DocumentError) -> ServiceError {
    ServiceError::InvalidResponse(error.to_string())
}

#[async_trait]
impl ReasoningAgent for OpenAiAgent {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn parse_question_paper(&self, text: &str) -> anyhow::Result<Vec<Question>> {
        let payload = self.complete(QUESTION_PAPER_PROMPT, text.to_string()).await?;
        let questions =
            parse_question_paper_str(&payload, REPLY_SOURCE).map_err(invalid_document)?;
        Ok(questions)
    }

    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn parse_model_answer(&self, text: &str) -> anyhow::Result<ModelKeySet> {
        let payload = self.complete(MODEL_ANSWER_PROMPT, text.to_string()).await?;
        let model_keys =
            parse_model_answers_str(&payload, REPLY_SOURCE).map_err(invalid_document)?;
        Ok(model_keys)
    }

    #[instrument(skip_all, fields(model = %self.model, questions = questions.len()))]
    async fn generate_feedback(
        &self,
        questions: &[Question],
        evaluations: &Evaluations,
    ) -> anyhow::Result<FeedbackSet> {
        let user = serde_json::to_string_pretty(&json!({
            "questions": questions,
            "evaluations": evaluations,
        }))?;
        let payload = self.complete(FEEDBACK_PROMPT, user).await?;
        let reply: FeedbackReply = serde_json::from_str(&payload)
            .map_err(|e| ServiceError::InvalidResponse(format!("feedback reply: {e}")))?;
        Ok(reply.feedback)
    }
}
