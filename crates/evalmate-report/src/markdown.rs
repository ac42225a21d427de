//! Markdown report generator, for pasting into issues, LMS comments or chat.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use evalmate_core::report::EvaluationReport;

/// Escape characters that would break a table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn phrases(list: &[String]) -> String {
    if list.is_empty() {
        "-".to_string()
    } else {
        cell(&list.join(", "))
    }
}

/// Generate a Markdown report from an evaluation report.
pub fn generate_markdown(report: &EvaluationReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    let _ = writeln!(md, "# evalmate report\n");
    let _ = writeln!(
        md,
        "Submission: **{}** | {} questions | {}\n",
        report.submission.source,
        summary.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        md,
        "**Total: {} / {} ({:.2}%)** | fully matched: {} | key points: {} / {}\n",
        summary.total_score,
        summary.total_out_of,
        summary.percentage,
        summary.fully_matched,
        summary.key_points_matched,
        summary.key_points_total
    );

    md.push_str("| Question | Score | Matched | Missing |\n");
    md.push_str("|---|---|---|---|\n");
    for (id, evaluation) in &report.evaluations {
        let _ = writeln!(
            md,
            "| {} | {} / {} | {} | {} |",
            cell(id),
            evaluation.score,
            evaluation.out_of,
            phrases(&evaluation.matched),
            phrases(&evaluation.missing)
        );
    }

    if let Some(feedback) = &report.feedback {
        md.push_str("\n## Feedback\n");
        for (id, text) in feedback {
            let title = report
                .question(id)
                .map(|q| format!("{id}: {}", q.question))
                .unwrap_or_else(|| id.clone());
            let _ = writeln!(md, "\n### {title}\n\n{text}");
            if let Some(audio) = report.audio.get(id) {
                let _ = writeln!(md, "\n[Listen]({})", audio.audio_url);
            }
        }
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))
        .with_context(|| format!("failed to write Markdown report to {}", path.display()))?;
    Ok(())
}
