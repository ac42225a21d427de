//! The `evalmate parse` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;

use evalmate_core::loader::question_paper_document;
use evalmate_core::tools::model_keys_tool_output;
use evalmate_core::traits::ExtractRequest;
use evalmate_providers::{create_agent, create_extractor, load_config_from};

#[derive(Clone, Copy, ValueEnum)]
pub enum DocumentKind {
    /// A question paper
    Questions,
    /// A model answer paper
    Answers,
}

pub async fn execute(
    kind: DocumentKind,
    input: PathBuf,
    document: bool,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let agent = create_agent(
        config
            .agent
            .as_ref()
            .context("no agent configured: add an [agent] table or set EVALMATE_OPENAI_KEY")?,
    )?;

    let text = if document {
        let extractor = create_extractor(
            config
                .ocr
                .as_ref()
                .context("no OCR service configured: add an [ocr] table or set EVALMATE_MARKER_URL")?,
        )?;
        let request = ExtractRequest {
            file_name: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| input.display().to_string()),
            content: std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?,
        };
        extractor.extract_text(&request).await?.text
    } else {
        std::fs::read_to_string(&input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let json = match kind {
        DocumentKind::Questions => {
            let questions = agent.parse_question_paper(&text).await?;
            tracing::info!(count = questions.len(), "parsed question paper");
            serde_json::to_string_pretty(&question_paper_document(&questions))?
        }
        DocumentKind::Answers => {
            let model_keys = agent.parse_model_answer(&text).await?;
            tracing::info!(count = model_keys.len(), "parsed model answers");
            model_keys_tool_output(&model_keys)?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
