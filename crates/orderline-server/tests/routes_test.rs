//! Webhook round-trip tests: telephony event in, TwiML document out.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use orderline_agent::{CompletionBackend, CompletionError, DialogueController};
use orderline_server::{app, AppState};
use orderline_session::{MemorySessionStore, SessionStore};
use orderline_types::Turn;
use orderline_voice::{AudioClip, SpeechSynthesizer, VoiceError};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const SCENARIO_A_REPLY: &str = r#"{"cart":[{"item":"3pc Fish Dinner","qty":1,"size":"large","sides":["fries"],"sauces":["tartar"]}],"action":"continue","say_text":"Got it, a large 3pc Fish Dinner with fries and tartar sauce. Anything else?"}"#;
const FINALIZE_REPLY: &str =
    r#"{"action":"finalize","say_text":"Your order is confirmed. Please pick up in 15-20 minutes."}"#;

struct ScriptedCompletion {
    reply: Option<String>,
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, _transcript: &[Turn]) -> Result<String, CompletionError> {
        self.reply.clone().ok_or_else(|| CompletionError::Status {
            status: 503,
            message: "scripted outage".to_string(),
        })
    }
}

struct ScriptedSpeech {
    fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSpeech {
    async fn synthesize(&self, _text: &str) -> Result<AudioClip, VoiceError> {
        if self.fail {
            return Err(VoiceError::Synthesis {
                status: 500,
                message: "scripted outage".to_string(),
            });
        }
        Ok(AudioClip {
            file_name: "clip.mp3".to_string(),
            url_path: "audio/clip.mp3".to_string(),
        })
    }
}

struct TestHarness {
    router: Router,
    sessions: Arc<MemorySessionStore>,
    audio_dir: TempDir,
}

fn harness(reply: Option<&str>, speech_fails: bool) -> TestHarness {
    let sessions = Arc::new(MemorySessionStore::default());
    let controller = DialogueController::new(
        Arc::new(ScriptedCompletion {
            reply: reply.map(str::to_string),
        }),
        Arc::new(ScriptedSpeech { fail: speech_fails }),
        sessions.clone(),
    );
    let audio_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState {
        controller,
        public_base_url: Some("https://orderline.example".to_string()),
        audio_dir: audio_dir.path().to_path_buf(),
    });
    TestHarness {
        router: app(state),
        sessions,
        audio_dir,
    }
}

fn form_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body: String = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", v.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn xml_body(response: axum::response::Response) -> String {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/xml"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn healthz_returns_ok() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn voice_without_a_welcome_clip_speaks_the_fallback() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Say>Hey there! Thanks for calling"));
    assert!(xml.contains("action=\"https://orderline.example/gather\""));
    assert!(xml.contains("speechTimeout=\"3\" timeout=\"10\""));
    assert!(xml.contains("<Redirect method=\"POST\">https://orderline.example/gather</Redirect>"));
}

#[tokio::test]
async fn voice_with_a_welcome_clip_plays_it() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    std::fs::write(harness.audio_dir.path().join("welcome.mp3"), b"mp3").unwrap();

    let response = harness
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Play>https://orderline.example/audio/welcome.mp3</Play>"));
    assert!(!xml.contains("<Say>Hey there!"));
}

#[tokio::test]
async fn empty_speech_re_gathers_without_speaking() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(form_request(
            "/gather",
            &[("CallSid", "CA1"), ("SpeechResult", "")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("action=\"https://orderline.example/gather\""));
    assert!(!xml.contains("<Say>"));
    assert!(!xml.contains("<Play>"));
    assert!(harness.sessions.get("CA1").await.unwrap().is_empty());
}

#[tokio::test]
async fn gather_supports_query_events_too() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(
            Request::builder()
                .uri("/gather?CallSid=CA1&SpeechResult=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let xml = xml_body(response).await;
    assert!(xml.contains("<Gather input=\"speech\""));
}

#[tokio::test]
async fn a_normal_turn_plays_the_clip_and_loops() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(form_request(
            "/gather",
            &[("CallSid", "CA1"), ("SpeechResult", "a large fish dinner")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Play>https://orderline.example/audio/clip.mp3</Play>"));
    assert!(xml.contains("<Redirect method=\"POST\">https://orderline.example/gather</Redirect>"));
    assert_eq!(harness.sessions.get("CA1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn synthesis_failure_falls_back_to_the_basic_voice() {
    let harness = harness(Some(SCENARIO_A_REPLY), true);
    let response = harness
        .router
        .oneshot(form_request(
            "/gather",
            &[("CallSid", "CA1"), ("SpeechResult", "a large fish dinner")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Say>Sorry, I had trouble generating audio."));
    assert!(xml.contains("Anything else?"));
    assert!(!xml.contains("<Play>"));
}

#[tokio::test]
async fn a_finalize_reply_opens_the_short_window() {
    let harness = harness(Some(FINALIZE_REPLY), false);
    let response = harness
        .router
        .oneshot(form_request(
            "/gather",
            &[("CallSid", "CA1"), ("SpeechResult", "that is everything")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("action=\"https://orderline.example/finalize_check\""));
    assert!(xml.contains("speechTimeout=\"2\" timeout=\"3\""));
    assert!(!xml.contains("<Redirect"));
}

#[tokio::test]
async fn completion_outage_becomes_a_spoken_apology_with_http_200() {
    let harness = harness(None, true);
    let response = harness
        .router
        .oneshot(form_request(
            "/gather",
            &[("CallSid", "CA1"), ("SpeechResult", "a large fish dinner")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("Please say your order again with the item and size."));
    assert!(xml.contains("<Redirect method=\"POST\">https://orderline.example/gather</Redirect>"));
    assert!(harness.sessions.get("CA1").await.unwrap().is_empty());
}

#[tokio::test]
async fn finalize_change_request_reopens_the_loop() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    harness
        .sessions
        .set("CA1", &[Turn::user("a fish dinner")])
        .await
        .unwrap();

    let response = harness
        .router
        .oneshot(form_request(
            "/finalize_check",
            &[("CallSid", "CA1"), ("SpeechResult", "actually add a drink")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Say>No problem, what would you like to change?</Say>"));
    assert!(xml.contains("<Redirect method=\"POST\">https://orderline.example/gather</Redirect>"));
    assert_eq!(harness.sessions.get("CA1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn finalize_silence_says_goodbye_and_hangs_up() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    harness
        .sessions
        .set("CA1", &[Turn::user("a fish dinner")])
        .await
        .unwrap();

    let response = harness
        .router
        .oneshot(form_request(
            "/finalize_check",
            &[("CallSid", "CA1"), ("SpeechResult", "")],
        ))
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Pause length=\"1\"/>"));
    assert!(xml.contains("<Say>Goodbye.</Say>"));
    assert!(xml.contains("<Hangup/>"));
    assert!(harness.sessions.get("CA1").await.unwrap().is_empty());
}

#[tokio::test]
async fn an_unreadable_event_recovers_instead_of_erroring() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    let response = harness
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gather")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    let xml = xml_body(response).await;

    assert!(xml.contains("<Say>Sorry, there was an error."));
    assert!(xml.contains("<Redirect method=\"POST\">https://orderline.example/voice</Redirect>"));
}

#[tokio::test]
async fn audio_clips_are_served_statically() {
    let harness = harness(Some(SCENARIO_A_REPLY), false);
    std::fs::write(harness.audio_dir.path().join("clip.mp3"), b"mp3 bytes").unwrap();

    let response = harness
        .router
        .oneshot(
            Request::builder()
                .uri("/audio/clip.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"mp3 bytes");
}
