//! Single-file HTML rendering of an evaluation report.
//!
//! Styles, the score chart and the table sorting script are embedded, so
//! the file can be mailed to a student or attached to a gradebook as is.

use anyhow::{Context, Result};
use std::path::Path;

use evalmate_core::report::EvaluationReport;
use evalmate_core::Evaluation;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn phrase_list(phrases: &[String]) -> String {
    if phrases.is_empty() {
        return "-".to_string();
    }
    phrases
        .iter()
        .map(|p| format!("<span class=\"phrase\">{}</span>", html_escape(p)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_class(evaluation: &Evaluation) -> &'static str {
    if !evaluation.has_key_points() {
        "unscored"
    } else if evaluation.is_fully_matched() {
        "pass"
    } else if evaluation.matched.is_empty() {
        "fail"
    } else {
        "partial"
    }
}

/// Generate an HTML report from an evaluation report.
pub fn generate_html(report: &EvaluationReport) -> String {
    let mut html = String::new();
    let summary = &report.summary;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>evalmate report: {}</title>\n",
        html_escape(&report.submission.source)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>evalmate report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Submission: <strong>{}</strong> | {} questions | {}</p>\n",
        html_escape(&report.submission.source),
        summary.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Totals and score chart
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Score</th><th>Percentage</th><th>Fully matched</th><th>Key points</th><th>Unscored</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{} / {}</td><td>{:.2}%</td><td>{} / {}</td><td>{} / {}</td><td>{}</td></tr></tbody>\n",
        summary.total_score,
        summary.total_out_of,
        summary.percentage,
        summary.fully_matched,
        summary.question_count,
        summary.key_points_matched,
        summary.key_points_total,
        summary.unscored,
    ));
    html.push_str("</table>\n");

    if !report.evaluations.is_empty() {
        html.push_str(&generate_bar_chart(report));
    }

    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Text</th><th onclick=\"sortTable(2)\">Score</th><th>Matched</th><th>Missing</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for (id, evaluation) in &report.evaluations {
        let text = report
            .question(id)
            .map(|q| q.question.as_str())
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{} / {}</td><td>{}</td><td>{}</td></tr>\n",
            row_class(evaluation),
            html_escape(id),
            html_escape(text),
            evaluation.score,
            evaluation.out_of,
            phrase_list(&evaluation.matched),
            phrase_list(&evaluation.missing),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Feedback
    if let Some(feedback) = &report.feedback {
        html.push_str("<section class=\"feedback\">\n");
        html.push_str("<h2>Feedback</h2>\n");
        for (id, text) in feedback {
            html.push_str(&format!(
                "<article><h3>{}</h3>\n<p>{}</p>\n",
                html_escape(id),
                html_escape(text)
            ));
            if let Some(audio) = report.audio.get(id) {
                html.push_str(&format!(
                    "<audio controls preload=\"none\" src=\"{}\"></audio>\n",
                    html_escape(&audio.audio_url)
                ));
            }
            html.push_str("</article>\n");
        }
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Horizontal bars showing each question's score as a share of its marks.
fn generate_bar_chart(report: &EvaluationReport) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 80;

    let bars: Vec<(&String, f64)> = report
        .evaluations
        .iter()
        .map(|(id, e)| {
            let share = if e.out_of > 0.0 {
                (e.score / e.out_of).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (id, share)
        })
        .collect();

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (id, share)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*share * max_width as f64) as usize;

        let color = if *share >= 0.8 {
            "#22c55e"
        } else if *share >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(id)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            share * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --partial: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --partial: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.partial { background: var(--partial); }
.fail { background: var(--fail); }
.unscored { color: #6b7280; }
.phrase { display: inline-block; margin: 0 0.25rem 0.25rem 0; padding: 0 0.4rem; border: 1px solid var(--border); border-radius: 4px; }
article { border-left: 4px solid var(--border); padding-left: 1rem; margin: 1rem 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
