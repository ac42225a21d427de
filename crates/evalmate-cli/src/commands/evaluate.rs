//! The `evalmate evaluate` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use evalmate_core::engine::validate_inputs;
use evalmate_core::pipeline::{EvaluationPipeline, ProgressReporter, Stage, Submission};
use evalmate_core::report::EvaluationReport;
use evalmate_core::Evaluation;
use evalmate_providers::{create_agent, create_extractor, create_synthesizer, load_config_from};
use evalmate_report::{write_html_report, write_markdown_report};

use super::load_documents;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Question paper JSON (default: from config)
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// Model answer JSON (default: from config)
    #[arg(long)]
    pub answers: Option<PathBuf>,

    /// Student answers as a plain text file
    #[arg(
        long,
        conflicts_with = "student_document",
        required_unless_present = "student_document"
    )]
    pub student_text: Option<PathBuf>,

    /// Student answers as a scanned document, sent to the OCR service
    #[arg(long)]
    pub student_document: Option<PathBuf>,

    /// Ask the reasoning agent for per-question feedback
    #[arg(long)]
    pub feedback: bool,

    /// Render the feedback as audio
    #[arg(long, requires = "feedback")]
    pub audio: bool,

    /// Voice for audio feedback
    #[arg(long)]
    pub voice: Option<String>,

    /// Reject invalid questions instead of scoring them
    #[arg(long)]
    pub strict: bool,

    /// Output directory (default: from config)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Report formats to write
    #[arg(long, value_enum, default_value = "json")]
    pub format: ReportFormat,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Html,
    Markdown,
    All,
}

impl ReportFormat {
    fn includes(self, other: ReportFormat) -> bool {
        self == ReportFormat::All || self == other
    }
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_stage_start(&self, stage: Stage) {
        eprintln!("  Starting: {stage}");
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        eprintln!("  Done: {stage} ({}ms)", elapsed.as_millis());
    }

    fn on_question_evaluated(&self, question_id: &str, evaluation: &Evaluation) {
        eprintln!(
            "    {question_id}: {} / {} ({} of {} key points)",
            evaluation.score,
            evaluation.out_of,
            evaluation.matched.len(),
            evaluation.matched.len() + evaluation.missing.len()
        );
    }

    fn on_audio_error(&self, question_id: &str, error: &str) {
        eprintln!("  ERROR: audio for {question_id}: {error}");
    }
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let (questions, model_keys) =
        load_documents(&config, args.questions.as_deref(), args.answers.as_deref())?;

    for warning in validate_inputs(&questions, &model_keys) {
        let prefix = warning
            .question_id
            .as_ref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        eprintln!("Warning: {prefix}{}", warning.message);
    }

    let submission = match (&args.student_text, &args.student_document) {
        (Some(path), _) => Submission::Text {
            source: path.display().to_string(),
            text: std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        },
        (None, Some(path)) => Submission::Document {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            content: std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        },
        (None, None) => anyhow::bail!("one of --student-text or --student-document is required"),
    };

    let mut pipeline_config = config.pipeline_config();
    pipeline_config.feedback = args.feedback;
    pipeline_config.audio = args.audio;
    pipeline_config.voice = args.voice.clone();
    pipeline_config.strict = args.strict;
    let mut pipeline = EvaluationPipeline::new(pipeline_config);

    if matches!(submission, Submission::Document { .. }) {
        let ocr = config
            .ocr
            .as_ref()
            .context("no OCR service configured: add an [ocr] table or set EVALMATE_MARKER_URL")?;
        pipeline = pipeline.with_extractor(create_extractor(ocr)?);
    }
    if args.feedback {
        let agent = config
            .agent
            .as_ref()
            .context("no agent configured: add an [agent] table or set EVALMATE_OPENAI_KEY")?;
        pipeline = pipeline.with_agent(create_agent(agent)?);
    }
    if args.audio {
        let speech = config.speech.as_ref().context(
            "no speech service configured: add a [speech] table or set EVALMATE_ELEVENLABS_KEY",
        )?;
        pipeline = pipeline.with_synthesizer(create_synthesizer(speech)?);
    }

    eprintln!(
        "evalmate v{} - Evaluating {} questions",
        env!("CARGO_PKG_VERSION"),
        questions.len()
    );
    eprintln!();

    let report = pipeline
        .run(&questions, &model_keys, submission, &ConsoleReporter)
        .await?;

    print_summary(&report);

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    write_reports(&report, &output, args.format)
}

fn write_reports(report: &EvaluationReport, output: &Path, format: ReportFormat) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    if format.includes(ReportFormat::Json) {
        let path = output.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }
    if format.includes(ReportFormat::Html) {
        let path = output.join(format!("report-{timestamp}.html"));
        write_html_report(report, &path)?;
        eprintln!("HTML report: {}", path.display());
    }
    if format.includes(ReportFormat::Markdown) {
        let path = output.join(format!("report-{timestamp}.md"));
        write_markdown_report(report, &path)?;
        eprintln!("Markdown report: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Score", "Out of", "Matched", "Missing"]);

    for (id, evaluation) in &report.evaluations {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(evaluation.score),
            Cell::new(evaluation.out_of),
            Cell::new(evaluation.matched.join(", ")),
            Cell::new(evaluation.missing.join(", ")),
        ]);
    }

    let summary = &report.summary;
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(summary.total_score),
        Cell::new(summary.total_out_of),
        Cell::new(format!("{:.2}%", summary.percentage)),
        Cell::new(""),
    ]);

    println!("{table}");

    if let Some(feedback) = &report.feedback {
        println!();
        for (id, text) in feedback {
            println!("{id}: {text}");
            if let Some(audio) = report.audio.get(id) {
                println!("    audio: {}", audio.audio_url);
            }
        }
    }
}
