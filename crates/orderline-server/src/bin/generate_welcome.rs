//! One-shot welcome-audio pregeneration.
//!
//! Renders the fixed greeting through the speech synthesizer and writes
//! it to `{audio_dir}/welcome.mp3`, where `/voice` picks it up. Run once
//! after changing the greeting or the voice; any failure here is a
//! startup-time error, never a call-path one.

use orderline_server::{config, WELCOME_FALLBACK, WELCOME_FILE};
use orderline_voice::ElevenLabsSynthesizer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let path = std::env::var("ORDERLINE_CONFIG_PATH").ok();
    let config = config::load_config(path.as_deref().or(Some("config.toml")))
        .expect("failed to load configuration");
    // Only the synthesizer is needed here; the completion key may be
    // absent when pregenerating audio on a build machine.
    assert!(
        !config.speech.api_key.is_empty() && !config.speech.voice_id.is_empty(),
        "missing ELEVENLABS_API_KEY or ELEVENLABS_VOICE_ID"
    );

    let audio_dir = PathBuf::from(&config.server.audio_dir);
    let synth = ElevenLabsSynthesizer::new(config.speech.clone(), &audio_dir)
        .expect("failed to build the speech synthesizer");

    let target = audio_dir.join(WELCOME_FILE);
    synth
        .synthesize_to(WELCOME_FALLBACK, &target)
        .await
        .expect("welcome synthesis failed");

    tracing::info!(path = %target.display(), "welcome message saved");
}
