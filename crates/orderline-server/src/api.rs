//! Webhook handlers for the telephony provider.
//!
//! Every handler returns valid TwiML with HTTP 200, even on internal
//! error: a broken response here would play an error tone to the
//! caller, so failures become spoken apologies instead.

use crate::twiml::{VoiceResponse, FINALIZE_GATHER, NORMAL_GATHER};
use crate::{AppState, WELCOME_FALLBACK, WELCOME_FILE};
use axum::extract::rejection::FormRejection;
use axum::extract::{Extension, Form};
use axum::http::{header, HeaderMap};
use axum::Json;
use orderline_agent::{DialogueOutcome, FinalizeOutcome, NextStep};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Spoken when a turn blows up before the controller can even run.
const RECOVER_APOLOGY: &str = "Sorry, there was an error. Please say your order again.";

/// Spoken before the reply text when synthesis failed and the basic
/// fallback voice reads it out.
const AUDIO_FALLBACK_NOTICE: &str = "Sorry, I had trouble generating audio. Here is the response.";

/// One inbound telephony event. Field names are the provider's.
#[derive(Debug, Deserialize)]
pub struct TelephonyEvent {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// Health check handler.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Handler for `GET|POST /voice`: the call entry point.
///
/// Plays the pregenerated welcome clip when present and non-empty,
/// otherwise speaks the fallback greeting, then opens the first capture.
pub async fn voice(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> VoiceResponse {
    let base = base_url(&headers, state.public_base_url.as_deref());
    let mut vr = VoiceResponse::new();

    match tokio::fs::metadata(state.audio_dir.join(WELCOME_FILE)).await {
        Ok(meta) if meta.len() > 0 => {
            vr.play(format!("{base}/audio/{WELCOME_FILE}"));
        }
        _ => {
            vr.say(WELCOME_FALLBACK);
        }
    }

    vr.gather(format!("{base}/gather"), NORMAL_GATHER);
    // No speech captured falls through to /gather, which re-gathers.
    vr.redirect(format!("{base}/gather"));
    vr
}

/// Handler for `GET|POST /gather`, one normal conversation turn.
pub async fn gather(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    event: Result<Form<TelephonyEvent>, FormRejection>,
) -> VoiceResponse {
    let base = base_url(&headers, state.public_base_url.as_deref());
    let Form(event) = match event {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!("unreadable telephony event on /gather: {rejection}");
            return recover(&base);
        }
    };

    let call_id = event.call_sid.as_deref().unwrap_or("unknown");
    let transcript = event.speech_result.as_deref().unwrap_or("");
    let outcome = state.controller.handle_turn(call_id, transcript).await;

    let mut vr = VoiceResponse::new();
    match outcome.next {
        NextStep::Reprompt => {
            vr.gather(format!("{base}/gather"), NORMAL_GATHER);
        }
        NextStep::ContinueLoop => {
            speak(&mut vr, &outcome, &base);
            vr.redirect(format!("{base}/gather"));
        }
        NextStep::FinalizeWindow => {
            speak(&mut vr, &outcome, &base);
            // Short second-chance window; /finalize_check decides
            // whether to hang up or continue.
            vr.gather(format!("{base}/finalize_check"), FINALIZE_GATHER);
        }
    }
    vr
}

/// Handler for `POST /finalize_check`, the change-your-mind window.
pub async fn finalize_check(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    event: Result<Form<TelephonyEvent>, FormRejection>,
) -> VoiceResponse {
    let base = base_url(&headers, state.public_base_url.as_deref());
    let Form(event) = match event {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!("unreadable telephony event on /finalize_check: {rejection}");
            return recover(&base);
        }
    };

    let call_id = event.call_sid.as_deref().unwrap_or("unknown");
    let transcript = event.speech_result.as_deref().unwrap_or("");

    let mut vr = VoiceResponse::new();
    match state.controller.handle_finalize(call_id, transcript).await {
        FinalizeOutcome::Reopen { say_text } => {
            vr.say(say_text);
            vr.redirect(format!("{base}/gather"));
        }
        FinalizeOutcome::End { say_text } => {
            vr.pause(1);
            vr.say(say_text);
            vr.hangup();
        }
    }
    vr
}

/// Renders the reply: the synthesized clip when available, otherwise
/// the basic fallback voice reading the text.
fn speak(vr: &mut VoiceResponse, outcome: &DialogueOutcome, base: &str) {
    match (&outcome.audio, &outcome.say_text) {
        (Some(clip_path), _) => {
            vr.play(format!("{base}/{clip_path}"));
        }
        (None, Some(text)) => {
            vr.say(AUDIO_FALLBACK_NOTICE);
            vr.say(text);
        }
        (None, None) => {}
    }
}

/// The `error-recover` instruction: apologize and restart the call flow.
pub fn recover(base: &str) -> VoiceResponse {
    let mut vr = VoiceResponse::new();
    vr.say(RECOVER_APOLOGY);
    vr.redirect(format!("{base}/voice"));
    vr
}

/// Resolves the public base URL the provider should call back on.
///
/// Priority: configured `public_base_url`, then the proxy's forwarded
/// headers, then the plain `Host` header.
pub fn base_url(headers: &HeaderMap, configured: Option<&str>) -> String {
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn configured_base_url_wins_and_loses_its_trailing_slash() {
        let headers = HeaderMap::new();
        assert_eq!(
            base_url(&headers, Some("https://orderline.example/")),
            "https://orderline.example"
        );
    }

    #[test]
    fn forwarded_headers_beat_the_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:3000"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("abc.ngrok-free.app"),
        );
        assert_eq!(base_url(&headers, None), "https://abc.ngrok-free.app");
    }

    #[test]
    fn host_header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("orderline.local"));
        assert_eq!(base_url(&headers, None), "https://orderline.local");
    }
}
