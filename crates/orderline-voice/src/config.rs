use serde::Deserialize;
use std::fmt;

fn default_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

/// Connection settings for the ElevenLabs speech-synthesis API.
#[derive(Clone, Deserialize)]
pub struct SpeechConfig {
    pub api_key: String,
    pub voice_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: String::new(),
            base_url: default_base_url(),
            model_id: default_model_id(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &"[REDACTED]")
            .field("voice_id", &self.voice_id)
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_api_key() {
        let config = SpeechConfig {
            api_key: "xi-secret".to_string(),
            voice_id: "voice-1".to_string(),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("xi-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
