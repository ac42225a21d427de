//! Configuration loading and collaborator factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use evalmate_core::pipeline::PipelineConfig;
use evalmate_core::traits::{ReasoningAgent, SpeechSynthesizer, TextExtractor};

use crate::elevenlabs::ElevenLabsSynthesizer;
use crate::marker::{self, MarkerExtractor};
use crate::openai::OpenAiAgent;

pub const CONFIG_FILE_NAME: &str = "evalmate.toml";

/// Reasoning agent configuration.
///
/// Note: Custom Debug impls in this module mask API keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

/// Document-to-text service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OcrConfig {
    Marker {
        url: String,
        #[serde(default = "default_ocr_timeout")]
        timeout_secs: u64,
    },
}

/// Text-to-speech service configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpeechConfig {
    ElevenLabs {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        default_voice: Option<String>,
        #[serde(default)]
        model_id: Option<String>,
        #[serde(default = "default_audio_dir")]
        audio_dir: PathBuf,
    },
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentConfig::OpenAI {
                api_key: _,
                base_url,
                model,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .field("org_id", org_id)
                .finish(),
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechConfig::ElevenLabs {
                api_key: _,
                base_url,
                default_voice,
                model_id,
                audio_dir,
            } => f
                .debug_struct("ElevenLabs")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("default_voice", default_voice)
                .field("model_id", model_id)
                .field("audio_dir", audio_dir)
                .finish(),
        }
    }
}

fn default_ocr_timeout() -> u64 {
    marker::DEFAULT_TIMEOUT_SECS
}
fn default_audio_dir() -> PathBuf {
    PathBuf::from("./evalmate-results/audio")
}

/// Top-level evalmate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalmateConfig {
    /// Default question paper document.
    #[serde(default = "default_question_paper")]
    pub question_paper: PathBuf,
    /// Default model answer document.
    #[serde(default = "default_model_answers")]
    pub model_answers: PathBuf,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Max concurrent audio renders.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Max retries on transient service errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub agent: Option<AgentConfig>,
    #[serde(default)]
    pub ocr: Option<OcrConfig>,
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
}

fn default_question_paper() -> PathBuf {
    PathBuf::from("modelquestionpaper.json")
}
fn default_model_answers() -> PathBuf {
    PathBuf::from("modelanswerpaper.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./evalmate-results")
}
fn default_parallelism() -> usize {
    4
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for EvalmateConfig {
    fn default() -> Self {
        Self {
            question_paper: default_question_paper(),
            model_answers: default_model_answers(),
            output_dir: default_output_dir(),
            parallelism: default_parallelism(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            agent: None,
            ocr: None,
            speech: None,
        }
    }
}

impl EvalmateConfig {
    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..PipelineConfig::default()
        }
    }

    /// Apply `EVALMATE_*` overrides using `lookup` to read variables.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("EVALMATE_OPENAI_KEY") {
            match &mut self.agent {
                Some(AgentConfig::OpenAI { api_key, .. }) => *api_key = key,
                None => {
                    self.agent = Some(AgentConfig::OpenAI {
                        api_key: key,
                        base_url: None,
                        model: None,
                        org_id: None,
                    })
                }
            }
        }

        if let Some(key) = lookup("EVALMATE_ELEVENLABS_KEY") {
            match &mut self.speech {
                Some(SpeechConfig::ElevenLabs { api_key, .. }) => *api_key = key,
                None => {
                    self.speech = Some(SpeechConfig::ElevenLabs {
                        api_key: key,
                        base_url: None,
                        default_voice: None,
                        model_id: None,
                        audio_dir: self.output_dir.join("audio"),
                    })
                }
            }
        }

        if let Some(url) = lookup("EVALMATE_MARKER_URL") {
            match &mut self.ocr {
                Some(OcrConfig::Marker { url: current, .. }) => *current = url,
                None => {
                    self.ocr = Some(OcrConfig::Marker {
                        url,
                        timeout_secs: default_ocr_timeout(),
                    })
                }
            }
        }
    }

    /// Resolve `${VAR}` references in every service table.
    fn resolve_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let resolve = |s: &mut String| *s = resolve_env_vars(s.as_str(), lookup);
        let resolve_opt = |s: &mut Option<String>| {
            if let Some(s) = s {
                *s = resolve_env_vars(s.as_str(), lookup);
            }
        };

        if let Some(AgentConfig::OpenAI {
            api_key,
            base_url,
            model,
            org_id,
        }) = &mut self.agent
        {
            resolve(api_key);
            resolve_opt(base_url);
            resolve_opt(model);
            resolve_opt(org_id);
        }
        if let Some(OcrConfig::Marker { url, .. }) = &mut self.ocr {
            resolve(url);
        }
        if let Some(SpeechConfig::ElevenLabs {
            api_key,
            base_url,
            default_voice,
            model_id,
            ..
        }) = &mut self.speech
        {
            resolve(api_key);
            resolve_opt(base_url);
            resolve_opt(default_voice);
            resolve_opt(model_id);
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = lookup(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        from = start + value.len();
    }
    result
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `evalmate.toml` in the current directory
/// 2. `~/.config/evalmate/config.toml`
///
/// Environment variable overrides: `EVALMATE_OPENAI_KEY`,
/// `EVALMATE_ELEVENLABS_KEY`, `EVALMATE_MARKER_URL`.
pub fn load_config() -> Result<EvalmateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EvalmateConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&content, process_env)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => finish(EvalmateConfig::default(), process_env),
    };

    Ok(config)
}

/// Parse a TOML config and apply overrides and `${VAR}` resolution.
fn parse_config(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EvalmateConfig> {
    let config = toml::from_str::<EvalmateConfig>(content)?;
    Ok(finish(config, lookup))
}

fn finish(
    mut config: EvalmateConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> EvalmateConfig {
    config.apply_overrides(&lookup);
    config.resolve_env(&lookup);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("evalmate"))
}

/// Create a reasoning agent from its configuration.
pub fn create_agent(config: &AgentConfig) -> Result<Arc<dyn ReasoningAgent>> {
    match config {
        AgentConfig::OpenAI {
            api_key,
            base_url,
            model,
            org_id,
        } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "the openai agent needs an api_key (or EVALMATE_OPENAI_KEY)"
            );
            Ok(Arc::new(OpenAiAgent::new(
                api_key,
                model.clone(),
                base_url.clone(),
                org_id.clone(),
            )?))
        }
    }
}

/// Create a text extractor from its configuration.
pub fn create_extractor(config: &OcrConfig) -> Result<Arc<dyn TextExtractor>> {
    match config {
        OcrConfig::Marker { url, timeout_secs } => {
            anyhow::ensure!(!url.is_empty(), "the marker extractor needs a url");
            Ok(Arc::new(MarkerExtractor::new(url, *timeout_secs)?))
        }
    }
}

/// Create a speech synthesizer from its configuration.
pub fn create_synthesizer(config: &SpeechConfig) -> Result<Arc<dyn SpeechSynthesizer>> {
    match config {
        SpeechConfig::ElevenLabs {
            api_key,
            base_url,
            default_voice,
            model_id,
            audio_dir,
        } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "the elevenlabs synthesizer needs an api_key (or EVALMATE_ELEVENLABS_KEY)"
            );
            Ok(Arc::new(ElevenLabsSynthesizer::new(
                api_key,
                base_url.clone(),
                default_voice.clone(),
                model_id.clone(),
                audio_dir,
            )?))
        }
    }
}
