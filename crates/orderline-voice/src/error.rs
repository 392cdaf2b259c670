use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("synthesis failed: {status} {message}")]
    Synthesis { status: u16, message: String },

    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
