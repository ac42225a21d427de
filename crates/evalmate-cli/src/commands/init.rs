//! The `evalmate init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    let files = [
        ("evalmate.toml", SAMPLE_CONFIG),
        ("modelquestionpaper.json", SAMPLE_QUESTION_PAPER),
        ("modelanswerpaper.json", SAMPLE_MODEL_ANSWERS),
        ("student_answers.txt", SAMPLE_STUDENT_ANSWERS),
    ];

    for (name, content) in files {
        if Path::new(name).exists() {
            println!("{name} already exists, skipping.");
        } else {
            std::fs::write(name, content).with_context(|| format!("failed to write {name}"))?;
            println!("Created {name}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Run: evalmate validate");
    println!("  2. Run: evalmate evaluate --student-text student_answers.txt");
    println!("  3. Add API keys to evalmate.toml or .env for --feedback and --audio");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# evalmate configuration

question_paper = "modelquestionpaper.json"
model_answers = "modelanswerpaper.json"
output_dir = "./evalmate-results"
parallelism = 4
max_retries = 3
retry_delay_ms = 1000

[agent]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-5.1"

[ocr]
type = "marker"
url = "http://localhost:8001/marker/upload"
timeout_secs = 120

[speech]
type = "elevenlabs"
api_key = "${ELEVENLABS_API_KEY}"
default_voice = "21m00Tcm4TlvDq8ikWAM"
audio_dir = "./evalmate-results/audio"
"#;

const SAMPLE_QUESTION_PAPER: &str = include_str!("../../samples/modelquestionpaper.json");
const SAMPLE_MODEL_ANSWERS: &str = include_str!("../../samples/modelanswerpaper.json");
const SAMPLE_STUDENT_ANSWERS: &str = include_str!("../../samples/student_answers.txt");
