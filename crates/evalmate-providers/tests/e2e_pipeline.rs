//! End-to-end pipeline tests using the mock collaborators.
//!
//! These run a full submission (extract → score → feedback → audio) without
//! touching the network.

use std::sync::Arc;
use std::time::Duration;

use evalmate_core::loader::{parse_model_answers_str, parse_question_paper_str};
use evalmate_core::pipeline::{EvaluationPipeline, NoopReporter, PipelineConfig, Submission};
use evalmate_core::traits::ReasoningAgent;
use evalmate_core::{FeedbackSet, ModelKeySet, Question};
use evalmate_providers::mock::{MockAgent, MockExtractor, MockSynthesizer};

const QUESTION_PAPER: &str = r#"{
  "required": [
    {"question_id": 1, "question": "Explain photosynthesis", "marks": 10},
    {"question_id": 2, "question": "State Newton's third law", "marks": 5},
    {"question_id": 3, "question": "Boiling point of water in Celsius", "marks": 2}
  ]
}"#;

const MODEL_ANSWERS: &str = r#"{
  "answers": [
    {
      "question_id": 1,
      "final_answer": {"reactants": "Carbon dioxide", "pigment": "Chlorophyll", "products": "Glucose"},
      "method": "Light energy"
    },
    {
      "question_id": 2,
      "final_answer": "Equal and opposite reaction",
      "workings": {"example": "rocket"}
    },
    {"question_id": 3, "final_answer": 100}
  ]
}"#;

const SCANNED_TEXT: &str = "Chlorophyll absorbs light energy and turns water and \
    carbon dioxide into food. Every action has an equal and opposite reaction. \
    Water boils at 100 degrees.";

fn documents() -> (Vec<Question>, ModelKeySet) {
    (
        parse_question_paper_str(QUESTION_PAPER, "paper").unwrap(),
        parse_model_answers_str(MODEL_ANSWERS, "answers").unwrap(),
    )
}

fn config(feedback: bool, audio: bool) -> PipelineConfig {
    PipelineConfig {
        feedback,
        audio,
        retry_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

fn scan() -> Submission {
    Submission::Document {
        file_name: "answer_sheet.pdf".into(),
        content: b"%PDF-1.4".to_vec(),
    }
}

#[tokio::test]
async fn e2e_document_with_feedback_and_audio() {
    let (questions, model_keys) = documents();
    let extractor = Arc::new(MockExtractor::with_text(SCANNED_TEXT));
    let agent = Arc::new(MockAgent::new(vec![], ModelKeySet::new()));
    let synthesizer = Arc::new(MockSynthesizer::new());

    let report = EvaluationPipeline::new(config(true, true))
        .with_extractor(extractor.clone())
        .with_agent(agent.clone())
        .with_synthesizer(synthesizer.clone())
        .run(&questions, &model_keys, scan(), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(extractor.call_count(), 1);
    assert_eq!(extractor.last_file().as_deref(), Some("answer_sheet.pdf"));
    assert_eq!(report.submission.source, "answer_sheet.pdf");

    assert_eq!(report.evaluations["Q1"].score, 7.5);
    assert_eq!(report.evaluations["Q1"].missing, vec!["glucose"]);
    assert_eq!(report.evaluations["Q2"].score, 2.5);
    assert_eq!(report.evaluations["Q3"].score, 2.0);
    assert_eq!(report.summary.total_score, 12.0);
    assert_eq!(report.summary.percentage, 70.59);

    let feedback = report.feedback.as_ref().unwrap();
    assert_eq!(agent.call_count(), 1);
    assert_eq!(
        feedback.keys().collect::<Vec<_>>(),
        vec!["Q1", "Q2", "Q3"]
    );
    assert!(feedback["Q1"].contains("Review: glucose"));
    assert!(feedback["Q3"].starts_with("Excellent work"));

    assert_eq!(synthesizer.call_count(), 3);
    assert_eq!(synthesizer.voices(), vec!["default"; 3]);
    assert_eq!(report.audio.keys().collect::<Vec<_>>(), vec!["Q1", "Q2", "Q3"]);
    assert!(report
        .audio
        .values()
        .all(|a| a.audio_url.starts_with("mock://audio/")));
}

#[tokio::test]
async fn e2e_partial_agent_feedback_is_completed() {
    let (questions, model_keys) = documents();
    let mut canned = FeedbackSet::new();
    canned.insert("Q2".into(), "Add an example, such as a rocket.".into());
    let agent = Arc::new(MockAgent::new(vec![], ModelKeySet::new()).with_feedback(canned));

    let report = EvaluationPipeline::new(config(true, false))
        .with_agent(agent)
        .run(
            &questions,
            &model_keys,
            Submission::inline(SCANNED_TEXT),
            &NoopReporter,
        )
        .await
        .unwrap();

    let feedback = report.feedback.unwrap();
    assert_eq!(feedback.len(), 3);
    assert_eq!(feedback["Q2"], "Add an example, such as a rocket.");
    assert!(feedback["Q1"].contains("7.5 out of 10"));
    assert!(report.audio.is_empty());
}

#[tokio::test]
async fn e2e_agent_parsed_documents_feed_the_pipeline() {
    let (questions, model_keys) = documents();
    let agent = MockAgent::new(questions, model_keys);

    // Parse via the agent, as the `parse` command does, then score
    let parsed_questions = agent.parse_question_paper("raw paper").await.unwrap();
    let parsed_keys = agent.parse_model_answer("raw answers").await.unwrap();
    assert_eq!(agent.call_count(), 2);

    let report = EvaluationPipeline::new(config(false, false))
        .run(
            &parsed_questions,
            &parsed_keys,
            Submission::inline("equal and opposite reaction, rocket"),
            &NoopReporter,
        )
        .await
        .unwrap();

    assert_eq!(report.evaluations["Q2"].score, 2.5);
    assert_eq!(report.evaluations["Q2"].missing, vec!["example: rocket"]);
    assert_eq!(report.evaluations["Q1"].score, 0.0);
    assert!(report.feedback.is_none());
}
