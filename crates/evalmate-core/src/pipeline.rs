//! Evaluation pipeline orchestrator.
//!
//! Runs one student submission end to end: text extraction, deterministic
//! scoring, agent feedback, and audio feedback. Collaborator calls are
//! retried on transient failures; audio is rendered with bounded
//! parallelism.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::{check_questions, evaluate};
use crate::error::ServiceError;
use crate::model::{Evaluation, Evaluations, FeedbackSet, ModelKeySet, Question};
use crate::report::{EvaluationReport, ReportSummary, StageTiming, SubmissionSummary};
use crate::traits::{
    AudioFeedback, ExtractRequest, ReasoningAgent, SpeechRequest, SpeechSynthesizer,
    TextExtractor,
};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the evaluation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum concurrent audio renders.
    pub parallelism: usize,
    /// Retries on transient collaborator errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Ask the agent for per-question feedback.
    pub feedback: bool,
    /// Render the feedback as audio.
    pub audio: bool,
    /// Voice for audio feedback.
    pub voice: Option<String>,
    /// Reject malformed questions instead of scoring them.
    pub strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            feedback: false,
            audio: false,
            voice: None,
            strict: false,
        }
    }
}

/// Where the student's answers come from.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Text that is already available.
    Text { source: String, text: String },
    /// A document that needs text extraction first.
    Document { file_name: String, content: Vec<u8> },
}

impl Submission {
    /// Inline text with no file behind it.
    pub fn inline(text: impl Into<String>) -> Self {
        Submission::Text {
            source: "inline".into(),
            text: text.into(),
        }
    }
}

/// A pipeline stage, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Evaluation,
    Feedback,
    Audio,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Evaluation => write!(f, "evaluation"),
            Stage::Feedback => write!(f, "feedback"),
            Stage::Audio => write!(f, "audio"),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_stage_start(&self, stage: Stage);
    fn on_stage_complete(&self, stage: Stage, elapsed: Duration);
    fn on_question_evaluated(&self, question_id: &str, evaluation: &Evaluation);
    fn on_audio_error(&self, question_id: &str, error: &str);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_stage_start(&self, _: Stage) {}
    fn on_stage_complete(&self, _: Stage, _: Duration) {}
    fn on_question_evaluated(&self, _: &str, _: &Evaluation) {}
    fn on_audio_error(&self, _: &str, _: &str) {}
}

/// The evaluation pipeline.
pub struct EvaluationPipeline {
    extractor: Option<Arc<dyn TextExtractor>>,
    agent: Option<Arc<dyn ReasoningAgent>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    config: PipelineConfig,
}

impl EvaluationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: None,
            agent: None,
            synthesizer: None,
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_agent(mut self, agent: Arc<dyn ReasoningAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Evaluate one submission against a question paper and key.
    pub async fn run(
        &self,
        questions: &[Question],
        model_keys: &ModelKeySet,
        submission: Submission,
        progress: &dyn ProgressReporter,
    ) -> Result<EvaluationReport> {
        let start = Instant::now();
        let mut timing = StageTiming::default();

        anyhow::ensure!(
            !self.config.audio || self.config.feedback,
            "audio feedback requires feedback to be enabled"
        );
        // Before extraction, so a rejected paper costs no service calls
        if self.config.strict {
            check_questions(questions)?;
        }

        // Student text
        let (source, student_text) = match submission {
            Submission::Text { source, text } => (source, text),
            Submission::Document { file_name, content } => {
                let extractor = self
                    .extractor
                    .as_ref()
                    .context("a document was submitted but no text extractor is configured")?;
                progress.on_stage_start(Stage::Extraction);
                let stage_start = Instant::now();
                let request = ExtractRequest {
                    file_name: file_name.clone(),
                    content,
                };
                let extracted = with_retries(&self.config, "text extraction", || {
                    extractor.extract_text(&request)
                })
                .await?;
                let elapsed = stage_start.elapsed();
                timing.extraction_ms = elapsed.as_millis() as u64;
                tracing::info!(
                    file = %file_name,
                    characters = extracted.text.chars().count(),
                    "extracted student text"
                );
                progress.on_stage_complete(Stage::Extraction, elapsed);
                (file_name, extracted.text)
            }
        };

        // Scoring
        progress.on_stage_start(Stage::Evaluation);
        let stage_start = Instant::now();
        let evaluations = evaluate(questions, model_keys, &student_text);
        for (id, evaluation) in &evaluations {
            progress.on_question_evaluated(id, evaluation);
        }
        let elapsed = stage_start.elapsed();
        timing.evaluation_ms = elapsed.as_millis() as u64;
        progress.on_stage_complete(Stage::Evaluation, elapsed);

        // Feedback
        let feedback = if self.config.feedback {
            let agent = self
                .agent
                .as_ref()
                .context("feedback was requested but no reasoning agent is configured")?;
            progress.on_stage_start(Stage::Feedback);
            let stage_start = Instant::now();
            let generated = with_retries(&self.config, "feedback generation", || {
                agent.generate_feedback(questions, &evaluations)
            })
            .await?;
            let feedback = complete_feedback(generated, &evaluations);
            let elapsed = stage_start.elapsed();
            timing.feedback_ms = elapsed.as_millis() as u64;
            progress.on_stage_complete(Stage::Feedback, elapsed);
            Some(feedback)
        } else {
            None
        };

        // Audio
        let audio = match (&feedback, self.config.audio) {
            (Some(feedback), true) => {
                let synthesizer = self
                    .synthesizer
                    .as_ref()
                    .context("audio feedback was requested but no speech synthesizer is configured")?;
                progress.on_stage_start(Stage::Audio);
                let stage_start = Instant::now();
                let audio = self.render_audio(synthesizer, feedback, progress).await;
                let elapsed = stage_start.elapsed();
                timing.audio_ms = elapsed.as_millis() as u64;
                progress.on_stage_complete(Stage::Audio, elapsed);
                audio
            }
            _ => IndexMap::new(),
        };

        let summary = ReportSummary::compute(&evaluations);
        tracing::info!(
            score = summary.total_score,
            out_of = summary.total_out_of,
            "evaluation complete"
        );

        Ok(EvaluationReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            submission: SubmissionSummary {
                source,
                characters: student_text.chars().count(),
            },
            questions: questions.to_vec(),
            evaluations,
            feedback,
            audio,
            summary,
            timing,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn render_audio(
        &self,
        synthesizer: &Arc<dyn SpeechSynthesizer>,
        feedback: &FeedbackSet,
        progress: &dyn ProgressReporter,
    ) -> IndexMap<String, AudioFeedback> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for (question_id, text) in feedback {
            let synthesizer = Arc::clone(synthesizer);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let request = SpeechRequest::new(text.clone(), config.voice.as_deref());
            let question_id = question_id.clone();

            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    with_retries(&config, "speech synthesis", || {
                        synthesizer.synthesize(&request)
                    })
                    .await
                };
                let result = inner.await;
                (question_id, result)
            });
        }

        let mut rendered = HashMap::new();
        while let Some((question_id, result)) = futures.next().await {
            match result {
                Ok(audio) => {
                    rendered.insert(question_id, audio);
                }
                Err(e) => {
                    tracing::warn!("audio feedback failed for {question_id}: {e:#}");
                    progress.on_audio_error(&question_id, &format!("{e:#}"));
                }
            }
        }

        // Keep feedback order rather than completion order
        feedback
            .keys()
            .filter_map(|id| rendered.remove(id).map(|audio| (id.clone(), audio)))
            .collect()
    }
}

/// Retry `call` on transient errors with exponential backoff.
///
/// A [`ServiceError`] that reports itself permanent is returned at once; a
/// rate limit's retry-after hint replaces the current delay.
async fn with_retries<T, F, Fut>(
    config: &PipelineConfig,
    operation: &str,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = config.retry_delay;
    let mut retries = 0u32;

    loop {
        let error = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let service_error = error.downcast_ref::<ServiceError>();
        let permanent = service_error.is_some_and(ServiceError::is_permanent);
        let retry_after = service_error.and_then(ServiceError::retry_after_ms);

        if permanent || retries >= config.max_retries {
            return Err(error.context(format!("{operation} failed")));
        }

        if let Some(ms) = retry_after {
            delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
        }
        retries += 1;
        tracing::warn!(
            "{operation} failed (retry {retries}/{}): {error:#}",
            config.max_retries
        );
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_RETRY_DELAY);
    }
}

/// Make sure there is exactly one non-empty feedback entry per evaluated
/// question, in evaluation order.
pub fn complete_feedback(mut generated: FeedbackSet, evaluations: &Evaluations) -> FeedbackSet {
    evaluations
        .iter()
        .map(|(id, evaluation)| {
            let text = generated
                .swap_remove(id)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| {
                    tracing::debug!(question = %id, "agent gave no feedback, using summary");
                    fallback_feedback(evaluation)
                });
            (id.clone(), text)
        })
        .collect()
}

/// Deterministic feedback built from an evaluation alone.
pub fn fallback_feedback(evaluation: &Evaluation) -> String {
    if !evaluation.has_key_points() {
        return format!(
            "No key points were available to check this answer ({} marks available).",
            evaluation.out_of
        );
    }
    if evaluation.missing.is_empty() {
        return format!(
            "Excellent work: you covered every key point and scored {} out of {}.",
            evaluation.score, evaluation.out_of
        );
    }
    let mut text = format!("You scored {} out of {}.", evaluation.score, evaluation.out_of);
    if !evaluation.matched.is_empty() {
        text.push_str(&format!(" You covered: {}.", evaluation.matched.join(", ")));
    }
    text.push_str(&format!(" Review: {}.", evaluation.missing.join(", ")));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::traits::ExtractedText;

    struct FixedExtractor {
        text: &'static str,
        calls: AtomicU32,
    }

    impl FixedExtractor {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn extract_text(&self, request: &ExtractRequest) -> Result<ExtractedText> {
            assert!(!request.content.is_empty());
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExtractedText {
                text: self.text.to_string(),
                latency_ms: 1,
            })
        }
    }

    /// Fails the first `failures` feedback calls.
    struct FlakyAgent {
        failures: u32,
        permanent: bool,
        retry_after_ms: Option<u64>,
        calls: AtomicU32,
    }

    impl FlakyAgent {
        fn new(failures: u32, permanent: bool) -> Self {
            Self {
                failures,
                permanent,
                retry_after_ms: None,
                calls: AtomicU32::new(0),
            }
        }

        fn rate_limited(failures: u32, retry_after_ms: u64) -> Self {
            Self {
                retry_after_ms: Some(retry_after_ms),
                ..Self::new(failures, false)
            }
        }
    }

    #[async_trait]
    impl ReasoningAgent for FlakyAgent {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn parse_question_paper(&self, _: &str) -> Result<Vec<Question>> {
            Ok(vec![])
        }

        async fn parse_model_answer(&self, _: &str) -> Result<ModelKeySet> {
            Ok(ModelKeySet::new())
        }

        async fn generate_feedback(
            &self,
            _: &[Question],
            evaluations: &Evaluations,
        ) -> Result<FeedbackSet> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.permanent {
                    return Err(ServiceError::AuthenticationFailed("bad key".into()).into());
                }
                if let Some(retry_after_ms) = self.retry_after_ms {
                    return Err(ServiceError::RateLimited { retry_after_ms }.into());
                }
                return Err(ServiceError::Timeout(1).into());
            }
            // Only the first question gets agent feedback
            Ok(evaluations
                .keys()
                .take(1)
                .map(|id| (id.clone(), format!("Agent feedback for {id}")))
                .collect())
        }
    }

    struct EchoSynthesizer {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SpeechSynthesizer for EchoSynthesizer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioFeedback> {
            if self.fail_on.is_some_and(|needle| request.text.contains(needle)) {
                return Err(ServiceError::ApiError {
                    status: 422,
                    message: "unsupported text".into(),
                }
                .into());
            }
            Ok(AudioFeedback {
                audio_url: format!("https://audio.test/{}/{}", request.voice, request.text.len()),
            })
        }
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn paper() -> (Vec<Question>, ModelKeySet) {
        let questions = vec![
            Question::new("Q1", "Explain photosynthesis", 10.0),
            Question::new("Q2", "State Newton's third law", 5.0),
        ];
        let mut keys = ModelKeySet::new();
        keys.insert("Q1".into(), vec!["chlorophyll".into(), "glucose".into()]);
        keys.insert("Q2".into(), vec!["equal and opposite".into()]);
        (questions, keys)
    }

    #[tokio::test]
    async fn scores_inline_text() {
        let (questions, keys) = paper();
        let pipeline = EvaluationPipeline::new(fast_config());
        let report = pipeline
            .run(
                &questions,
                &keys,
                Submission::inline("Chlorophyll captures light."),
                &NoopReporter,
            )
            .await
            .unwrap();

        assert_eq!(report.evaluations["Q1"].score, 5.0);
        assert_eq!(report.evaluations["Q2"].score, 0.0);
        assert_eq!(report.summary.total_out_of, 15.0);
        assert_eq!(report.submission.source, "inline");
        assert!(report.feedback.is_none());
        assert!(report.audio.is_empty());
    }

    #[tokio::test]
    async fn extracts_document_text_first() {
        let (questions, keys) = paper();
        let extractor = FixedExtractor::new("every action has an EQUAL AND OPPOSITE reaction");
        let pipeline = EvaluationPipeline::new(fast_config()).with_extractor(Arc::new(extractor));
        let report = pipeline
            .run(
                &questions,
                &keys,
                Submission::Document {
                    file_name: "answer_handwritten.pdf".into(),
                    content: vec![1, 2, 3],
                },
                &NoopReporter,
            )
            .await
            .unwrap();

        assert_eq!(report.evaluations["Q2"].score, 5.0);
        assert_eq!(report.submission.source, "answer_handwritten.pdf");
    }

    #[tokio::test]
    async fn document_without_extractor_fails() {
        let (questions, keys) = paper();
        let err = EvaluationPipeline::new(fast_config())
            .run(
                &questions,
                &keys,
                Submission::Document {
                    file_name: "a.pdf".into(),
                    content: vec![0],
                },
                &NoopReporter,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no text extractor"));
    }

    #[tokio::test]
    async fn strict_mode_rejects_duplicate_ids() {
        let questions = vec![
            Question::new("Q1", "a", 5.0),
            Question::new("Q1", "b", 5.0),
        ];
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            strict: true,
            ..fast_config()
        });
        let err = pipeline
            .run(&questions, &ModelKeySet::new(), Submission::inline(""), &NoopReporter)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::DocumentError>(),
            Some(crate::error::DocumentError::Validation { entry, .. }) if entry == "Q1"
        ));
    }

    #[tokio::test]
    async fn strict_mode_rejects_before_extraction() {
        let questions = vec![Question::new("", "unnamed", 5.0)];
        let extractor = Arc::new(FixedExtractor::new("text"));
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            strict: true,
            ..fast_config()
        })
        .with_extractor(extractor.clone());

        let err = pipeline
            .run(
                &questions,
                &ModelKeySet::new(),
                Submission::Document {
                    file_name: "scan.pdf".into(),
                    content: vec![1],
                },
                &NoopReporter,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("question id is empty"));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retries_transient_feedback_errors() {
        let (questions, keys) = paper();
        let agent = Arc::new(FlakyAgent::new(2, false));
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            ..fast_config()
        })
        .with_agent(agent.clone());

        let report = pipeline
            .run(&questions, &keys, Submission::inline("glucose"), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(agent.calls.load(Ordering::SeqCst), 3);
        let feedback = report.feedback.unwrap();
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback["Q1"], "Agent feedback for Q1");
        assert!(feedback["Q2"].contains("Review: equal and opposite"));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let (questions, keys) = paper();
        let agent = Arc::new(FlakyAgent::new(5, true));
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            ..fast_config()
        })
        .with_agent(agent.clone());

        let err = pipeline
            .run(&questions, &keys, Submission::inline(""), &NoopReporter)
            .await
            .unwrap_err();

        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert!(format!("{err:#}").contains("authentication failed"));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (questions, keys) = paper();
        let agent = Arc::new(FlakyAgent::new(10, false));
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            max_retries: 2,
            ..fast_config()
        })
        .with_agent(agent.clone());

        let err = pipeline
            .run(&questions, &keys, Submission::inline(""), &NoopReporter)
            .await
            .unwrap_err();

        assert_eq!(agent.calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("feedback generation failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_hint_is_capped() {
        let (questions, keys) = paper();
        let agent = Arc::new(FlakyAgent::rate_limited(1, 3_600_000));
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            ..fast_config()
        })
        .with_agent(agent.clone());

        let started = tokio::time::Instant::now();
        pipeline
            .run(&questions, &keys, Submission::inline("glucose"), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(agent.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= MAX_RETRY_DELAY);
        assert!(started.elapsed() < MAX_RETRY_DELAY + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn renders_audio_in_feedback_order() {
        let (questions, keys) = paper();
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            audio: true,
            parallelism: 1,
            voice: Some("rachel".into()),
            ..fast_config()
        })
        .with_agent(Arc::new(FlakyAgent::new(0, false)))
        .with_synthesizer(Arc::new(EchoSynthesizer { fail_on: None }));

        let report = pipeline
            .run(&questions, &keys, Submission::inline("glucose"), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.audio.keys().collect::<Vec<_>>(), vec!["Q1", "Q2"]);
        assert!(report.audio["Q1"].audio_url.contains("/rachel/"));
    }

    #[tokio::test]
    async fn audio_failures_are_not_fatal() {
        let (questions, keys) = paper();
        let pipeline = EvaluationPipeline::new(PipelineConfig {
            feedback: true,
            audio: true,
            ..fast_config()
        })
        .with_agent(Arc::new(FlakyAgent::new(0, false)))
        .with_synthesizer(Arc::new(EchoSynthesizer {
            fail_on: Some("Review"),
        }));

        let report = pipeline
            .run(&questions, &keys, Submission::inline("glucose"), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.audio.len(), 1);
        assert!(report.audio.contains_key("Q1"));
        assert!(report.audio["Q1"].audio_url.contains("/default/"));
    }

    #[tokio::test]
    async fn audio_requires_feedback() {
        let (questions, keys) = paper();
        let err = EvaluationPipeline::new(PipelineConfig {
            audio: true,
            ..fast_config()
        })
        .run(&questions, &keys, Submission::inline(""), &NoopReporter)
        .await
        .unwrap_err();
        assert!(err.to_string().contains("requires feedback"));
    }

    #[test]
    fn fallback_feedback_variants() {
        assert!(fallback_feedback(&Evaluation::unscored(4.0)).contains("No key points"));

        let full = Evaluation {
            score: 5.0,
            out_of: 5.0,
            matched: vec!["force".into()],
            missing: vec![],
        };
        assert!(fallback_feedback(&full).starts_with("Excellent"));

        let partial = Evaluation {
            score: 2.5,
            out_of: 5.0,
            matched: vec!["force".into()],
            missing: vec!["mass".into()],
        };
        assert_eq!(
            fallback_feedback(&partial),
            "You scored 2.5 out of 5. You covered: force. Review: mass."
        );
    }

    #[test]
    fn complete_feedback_drops_unknown_ids_and_blanks() {
        let mut evaluations = Evaluations::new();
        evaluations.insert("Q1".into(), Evaluation::unscored(1.0));
        evaluations.insert("Q2".into(), Evaluation::unscored(1.0));

        let mut generated = FeedbackSet::new();
        generated.insert("Q9".into(), "stray".into());
        generated.insert("Q2".into(), "Nice".into());
        generated.insert("Q1".into(), "   ".into());

        let feedback = complete_feedback(generated, &evaluations);
        assert_eq!(feedback.keys().collect::<Vec<_>>(), vec!["Q1", "Q2"]);
        assert_eq!(feedback["Q2"], "Nice");
        assert!(feedback["Q1"].contains("No key points"));
    }
}
