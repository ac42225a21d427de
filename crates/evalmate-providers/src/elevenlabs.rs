//! ElevenLabs text-to-speech client.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use evalmate_core::traits::{AudioFeedback, SpeechRequest, SpeechSynthesizer, DEFAULT_VOICE};
use evalmate_core::ServiceError;

use crate::http::{build_client, check_status, send_error};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// The "Rachel" premade voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Speech synthesizer that writes ElevenLabs MP3 output to a local directory.
pub struct ElevenLabsSynthesizer {
    api_key: String,
    base_url: String,
    default_voice_id: String,
    model_id: String,
    audio_dir: PathBuf,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSynthesizer {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        default_voice_id: Option<String>,
        model_id: Option<String>,
        audio_dir: &Path,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_voice_id: default_voice_id.unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            model_id: model_id.unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            audio_dir: audio_dir.to_path_buf(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Map the generic voice name onto a concrete ElevenLabs voice id.
    fn voice_id<'a>(&'a self, voice: &'a str) -> &'a str {
        if voice.is_empty() || voice == DEFAULT_VOICE {
            &self.default_voice_id
        } else {
            voice
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    #[instrument(skip(self, request), fields(voice = %request.voice, characters = request.text.len()))]
    async fn synthesize(&self, request: &SpeechRequest) -> anyhow::Result<AudioFeedback> {
        let voice_id = self.voice_id(&request.voice);
        let body = TtsRequest {
            text: &request.text,
            model_id: &self.model_id,
        };

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice_id}", self.base_url))
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response).await?;

        let audio = response
            .bytes()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        if audio.is_empty() {
            return Err(ServiceError::InvalidResponse("empty audio body".into()).into());
        }

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .with_context(|| format!("failed to create {}", self.audio_dir.display()))?;
        let path = self
            .audio_dir
            .join(format!("feedback-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, &audio)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        let path = tokio::fs::canonicalize(&path).await?;

        tracing::debug!(path = %path.display(), bytes = audio.len(), "wrote audio feedback");

        Ok(AudioFeedback {
            audio_url: format!("file://{}", path.display()),
        })
    }
}
