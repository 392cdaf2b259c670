//! Orderline server library logic.
//!
//! Wires the dialogue controller to the telephony provider's webhook
//! cycle: each inbound call event is one stateless request, answered
//! with a TwiML document, with all cross-request continuity living in
//! the session store.

pub mod api;
pub mod config;
pub mod twiml;

use axum::routing::{get, post};
use axum::{Extension, Router};
use orderline_agent::DialogueController;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// File name of the pregenerated greeting inside the audio directory.
pub const WELCOME_FILE: &str = "welcome.mp3";

/// Greeting text: spoken directly when no pregenerated clip exists,
/// and rendered to `welcome.mp3` by the `generate-welcome` binary.
pub const WELCOME_FALLBACK: &str = "Hey there! Thanks for calling Captain Sam's Fish and Chicken. \
                                    Want to place an order for pickup?";

/// Application state shared across all request handlers.
pub struct AppState {
    /// The per-call dialogue controller.
    pub controller: DialogueController,
    /// Configured public base URL override, if any.
    pub public_base_url: Option<String>,
    /// Directory audio clips are served from.
    pub audio_dir: PathBuf,
}

/// Builds the application router with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/voice", get(api::voice).post(api::voice))
        .route("/gather", get(api::gather).post(api::gather))
        .route("/finalize_check", post(api::finalize_check))
        .nest_service("/audio", ServeDir::new(&state.audio_dir))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
