use crate::config::SpeechConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Maximum text input size for synthesis (8 KiB). Prevents resource
/// exhaustion from oversized synthesis requests; spoken replies are a
/// few hundred characters at most.
const MAX_SYNTH_INPUT_BYTES: usize = 8 * 1024;

/// External-call budget for one synthesis request.
const SYNTH_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of a provider error body to keep in the error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// A rendered audio clip sitting in the served audio directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Bare file name, e.g. `b7e2….mp3`.
    pub file_name: String,
    /// Relative URL path under the server root, e.g. `audio/b7e2….mp3`.
    pub url_path: String,
}

/// Converts text to a playable audio clip.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, VoiceError>;
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    optimize_streaming_latency: u32,
}

/// ElevenLabs-backed synthesizer writing MP3 clips into `audio_dir`.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: SpeechConfig,
    audio_dir: PathBuf,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SpeechConfig, audio_dir: impl AsRef<Path>) -> Result<Self, VoiceError> {
        let client = reqwest::Client::builder()
            .timeout(SYNTH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config,
            audio_dir: audio_dir.as_ref().to_path_buf(),
        })
    }

    /// Renders `text` and writes the MP3 to an explicit path. Used by the
    /// one-shot welcome pregeneration step.
    pub async fn synthesize_to(&self, text: &str, path: impl AsRef<Path>) -> Result<(), VoiceError> {
        let audio = self.fetch_audio(text).await?;
        if let Some(parent) = path.as_ref().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &audio).await?;
        Ok(())
    }

    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_SYNTH_INPUT_BYTES {
            return Err(VoiceError::Config(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_SYNTH_INPUT_BYTES
            )));
        }

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        );
        let body = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            optimize_streaming_latency: 1,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() || bytes.is_empty() {
            let message: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(ERROR_BODY_EXCERPT)
                .collect();
            return Err(VoiceError::Synthesis {
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, VoiceError> {
        let audio = self.fetch_audio(text).await?;

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let file_name = format!("{}.mp3", Uuid::new_v4());
        tokio::fs::write(self.audio_dir.join(&file_name), &audio).await?;

        tracing::debug!(file = %file_name, bytes = audio.len(), "wrote synthesized clip");
        Ok(AudioClip {
            url_path: format!("audio/{file_name}"),
            file_name,
        })
    }
}
