//! Mock collaborators for testing the pipeline without real services.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use evalmate_core::pipeline::fallback_feedback;
use evalmate_core::traits::{
    AudioFeedback, ExtractRequest, ExtractedText, ReasoningAgent, SpeechRequest,
    SpeechSynthesizer, TextExtractor,
};
use evalmate_core::{Evaluations, FeedbackSet, ModelKeySet, Question};

/// A mock extractor that returns the same text for every document.
pub struct MockExtractor {
    text: String,
    call_count: AtomicU32,
    last_file: Mutex<Option<String>>,
}

impl MockExtractor {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            call_count: AtomicU32::new(0),
            last_file: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// File name of the last document received.
    pub fn last_file(&self) -> Option<String> {
        self.last_file
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl TextExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_text(&self, request: &ExtractRequest) -> anyhow::Result<ExtractedText> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_file.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(request.file_name.clone());
        Ok(ExtractedText {
            text: self.text.clone(),
            latency_ms: 1,
        })
    }
}

/// A mock agent with canned parse results.
///
/// Feedback is either the configured set or, when none is configured, the
/// deterministic fallback text for each evaluation.
pub struct MockAgent {
    questions: Vec<Question>,
    model_keys: ModelKeySet,
    feedback: Option<FeedbackSet>,
    call_count: AtomicU32,
}

impl MockAgent {
    pub fn new(questions: Vec<Question>, model_keys: ModelKeySet) -> Self {
        Self {
            questions,
            model_keys,
            feedback: None,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn with_feedback(mut self, feedback: FeedbackSet) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReasoningAgent for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn parse_question_paper(&self, _text: &str) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.questions.clone())
    }

    async fn parse_model_answer(&self, _text: &str) -> anyhow::Result<ModelKeySet> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.model_keys.clone())
    }

    async fn generate_feedback(
        &self,
        _questions: &[Question],
        evaluations: &Evaluations,
    ) -> anyhow::Result<FeedbackSet> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(match &self.feedback {
            Some(feedback) => feedback.clone(),
            None => evaluations
                .iter()
                .map(|(id, evaluation)| (id.clone(), fallback_feedback(evaluation)))
                .collect(),
        })
    }
}

/// A mock synthesizer that hands out `mock://` URLs.
pub struct MockSynthesizer {
    call_count: AtomicU32,
    voices: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU32::new(0),
            voices: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Voices requested so far, in call order.
    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, request: &SpeechRequest) -> anyhow::Result<AudioFeedback> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.voices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.voice.clone());
        Ok(AudioFeedback {
            audio_url: format!("mock://audio/{n}.mp3"),
        })
    }
}
