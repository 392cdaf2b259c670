//! Speech synthesis for the Orderline platform.
//!
//! Turns the dialogue controller's reply text into playable audio: the
//! ElevenLabs HTTP API renders MP3 bytes, which land in a served audio
//! directory under a fresh UUID file name. The caller gets back the
//! relative URL path to hand to the telephony provider's `<Play>` verb.
//!
//! Synthesis failures are loud (`VoiceError` with provider status and
//! message) but the dialogue controller treats them as per-turn
//! degradations, falling back to the provider's basic voice.

pub mod config;
pub mod error;
pub mod synth;

pub use config::SpeechConfig;
pub use error::VoiceError;
pub use synth::{AudioClip, ElevenLabsSynthesizer, SpeechSynthesizer};
