//! Collaborator trait definitions.
//!
//! The engine never talks to the network. Everything it needs from the
//! outside world goes through one of three narrow async traits, which the
//! `evalmate-providers` crate implements against real services and mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Evaluations, FeedbackSet, ModelKeySet, Question};

// ---------------------------------------------------------------------------
// Document-to-text extraction
// ---------------------------------------------------------------------------

/// Trait for services that turn an uploaded document (e.g. a scanned,
/// handwritten PDF) into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Human-readable service name (e.g. "marker").
    fn name(&self) -> &str;

    /// Extract the text of a document.
    async fn extract_text(&self, request: &ExtractRequest) -> anyhow::Result<ExtractedText>;
}

/// A document to extract text from.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// File name sent along with the content.
    pub file_name: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

/// Text extracted from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// The extracted text (markdown or plain).
    pub text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Reasoning agent
// ---------------------------------------------------------------------------

/// Trait for the LLM-backed agent that parses papers and writes feedback.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    /// Human-readable agent name (e.g. "openai").
    fn name(&self) -> &str;

    /// Turn raw question paper text into questions.
    async fn parse_question_paper(&self, text: &str) -> anyhow::Result<Vec<Question>>;

    /// Turn raw model answer text into key phrases per question.
    async fn parse_model_answer(&self, text: &str) -> anyhow::Result<ModelKeySet>;

    /// Write one piece of feedback per evaluated question.
    async fn generate_feedback(
        &self,
        questions: &[Question],
        evaluations: &Evaluations,
    ) -> anyhow::Result<FeedbackSet>;
}

// ---------------------------------------------------------------------------
// Speech synthesis
// ---------------------------------------------------------------------------

/// Voice used when the caller does not pick one.
pub const DEFAULT_VOICE: &str = "default";

/// Trait for text-to-speech services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Human-readable service name (e.g. "elevenlabs").
    fn name(&self) -> &str;

    /// Render feedback text as audio and return where it can be fetched.
    async fn synthesize(&self, request: &SpeechRequest) -> anyhow::Result<AudioFeedback>;
}

/// Text to render as speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// The feedback text.
    pub text: String,
    /// Voice identifier.
    #[serde(default = "default_voice")]
    pub voice: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: Option<&str>) -> Self {
        Self {
            text: text.into(),
            voice: voice.unwrap_or(DEFAULT_VOICE).to_string(),
        }
    }
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

/// Rendered audio feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeedback {
    /// URL where the audio file is hosted.
    pub audio_url: String,
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a markdown-formatted LLM response.
///
/// Handles:
/// - Single or multiple ```json``` blocks (the first one wins)
/// - Generic ``` blocks (if no json-specific blocks found)
/// - Raw JSON with no markdown blocks (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated replies leave the last block open
    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_blocks.push(current_block);
        } else if is_generic_block {
            generic_blocks.push(current_block);
        }
    }

    if let Some(block) = json_blocks.into_iter().next() {
        return block;
    }

    if let Some(block) = generic_blocks.into_iter().next() {
        return block;
    }

    response.trim().to_string()
}
