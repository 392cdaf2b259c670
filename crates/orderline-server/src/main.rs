//! Orderline server binary: answers the restaurant's pickup line.
//!
//! Starts an axum HTTP server with structured logging, a session store
//! (redis or in-memory), both provider adapters, and graceful shutdown
//! on SIGTERM/SIGINT.

use orderline_agent::{DialogueController, OpenAiCompletion};
use orderline_server::{app, config, AppState};
use orderline_session::{MemorySessionStore, RedisSessionStore, SessionStore};
use orderline_voice::ElevenLabsSynthesizer;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("ORDERLINE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");
    config
        .validate()
        .expect("missing provider credentials; set the keys named in the error and restart");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Session store: redis in production, in-memory when unconfigured.
    let sessions: Arc<dyn SessionStore> = if config.session.redis_url.is_empty() {
        tracing::warn!("no redis_url configured, using the in-memory session store");
        Arc::new(MemorySessionStore::new(Duration::from_secs(
            config.session.ttl_seconds,
        )))
    } else {
        Arc::new(
            RedisSessionStore::connect(&config.session.redis_url, config.session.ttl_seconds)
                .await
                .expect("failed to connect to redis; check session.redis_url in config"),
        )
    };

    // Provider adapters, one client each for the life of the process.
    let audio_dir = PathBuf::from(&config.server.audio_dir);
    // The audio directory must exist before ServeDir mounts it.
    std::fs::create_dir_all(&audio_dir).expect("failed to create the audio directory");

    let completion = OpenAiCompletion::new(config.completion.clone())
        .expect("failed to build the completion client");
    let speech = ElevenLabsSynthesizer::new(config.speech.clone(), &audio_dir)
        .expect("failed to build the speech synthesizer");

    let controller =
        DialogueController::new(Arc::new(completion), Arc::new(speech), sessions);

    let state = Arc::new(AppState {
        controller,
        public_base_url: config.server.public_base_url.clone(),
        audio_dir,
    });

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting orderline server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("orderline server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
