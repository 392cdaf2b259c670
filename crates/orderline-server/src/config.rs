//! Server configuration loading from file and environment variables.

use orderline_agent::CompletionConfig;
use orderline_voice::SpeechConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Call session storage settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Chat-completion provider settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Speech-synthesis provider settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL the telephony provider calls back on (e.g. an
    /// ngrok https URL). When unset, each request's forwarded headers
    /// decide.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Directory audio clips are written to and served from.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
}

/// Call session storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Redis connection URL. An empty string selects the in-memory
    /// store (development only: histories die with the process).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Sliding session expiry in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "orderline_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_session_ttl() -> u64 {
    orderline_session::DEFAULT_SESSION_TTL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
            audio_dir: default_audio_dir(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            ttl_seconds: default_session_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required provider credentials are absent.
    #[error("missing required credentials: {0}")]
    MissingCredentials(String),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `ORDERLINE_HOST` overrides `server.host`
/// - `ORDERLINE_PORT` overrides `server.port`
/// - `ORDERLINE_PUBLIC_BASE_URL` overrides `server.public_base_url`
/// - `ORDERLINE_AUDIO_DIR` overrides `server.audio_dir`
/// - `ORDERLINE_REDIS_URL` overrides `session.redis_url`
/// - `ORDERLINE_LOG_LEVEL` overrides `logging.level`
/// - `ORDERLINE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` overrides `completion.api_key`
/// - `ELEVENLABS_API_KEY` overrides `speech.api_key`
/// - `ELEVENLABS_VOICE_ID` overrides `speech.voice_id`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("ORDERLINE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("ORDERLINE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(url) = std::env::var("ORDERLINE_PUBLIC_BASE_URL") {
        config.server.public_base_url = Some(url);
    }
    if let Ok(dir) = std::env::var("ORDERLINE_AUDIO_DIR") {
        config.server.audio_dir = dir;
    }
    if let Ok(url) = std::env::var("ORDERLINE_REDIS_URL") {
        config.session.redis_url = url;
    }
    if let Ok(level) = std::env::var("ORDERLINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("ORDERLINE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config.completion.api_key = key;
    }
    if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
        config.speech.api_key = key;
    }
    if let Ok(voice) = std::env::var("ELEVENLABS_VOICE_ID") {
        config.speech.voice_id = voice;
    }

    Ok(config)
}

impl Config {
    /// Fails fast when provider credentials are absent, naming every
    /// missing one at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.completion.api_key.is_empty() {
            missing.push("completion.api_key (OPENAI_API_KEY)");
        }
        if self.speech.api_key.is_empty() {
            missing.push("speech.api_key (ELEVENLABS_API_KEY)");
        }
        if self.speech.voice_id.is_empty() {
            missing.push("speech.voice_id (ELEVENLABS_VOICE_ID)");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(missing.join(", ")))
        }
    }
}
