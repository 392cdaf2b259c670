//! Call-control markup rendering.
//!
//! Serializes the dialogue controller's decision into the TwiML verbs
//! the telephony provider executes: play audio, speak literal text,
//! gather more speech, redirect, pause, hang up. Every handler returns
//! one of these documents with HTTP 200; internal errors become spoken
//! apologies, never transport failures.

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Speech-capture window for a `<Gather>` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherWindow {
    /// Seconds of silence that end the capture.
    pub speech_timeout_secs: u32,
    /// Hard cap on the whole capture.
    pub timeout_secs: u32,
}

/// Capture window for normal ordering turns.
pub const NORMAL_GATHER: GatherWindow = GatherWindow {
    speech_timeout_secs: 3,
    timeout_secs: 10,
};

/// Tighter window for the change-your-mind check after finalize.
pub const FINALIZE_GATHER: GatherWindow = GatherWindow {
    speech_timeout_secs: 2,
    timeout_secs: 3,
};

#[derive(Debug, Clone)]
enum Verb {
    Play(String),
    Say(String),
    Gather { action: String, window: GatherWindow },
    Redirect(String),
    Pause(u32),
    Hangup,
}

/// Builder for one TwiML response document.
#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, url: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Play(url.into()));
        self
    }

    pub fn say(&mut self, text: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    /// Captures speech and POSTs the transcript to `action`.
    pub fn gather(&mut self, action: impl Into<String>, window: GatherWindow) -> &mut Self {
        self.verbs.push(Verb::Gather {
            action: action.into(),
            window,
        });
        self
    }

    pub fn redirect(&mut self, url: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    pub fn pause(&mut self, length_secs: u32) -> &mut Self {
        self.verbs.push(Verb::Pause(length_secs));
        self
    }

    pub fn hangup(&mut self) -> &mut Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Play(url) => {
                    xml.push_str(&format!("<Play>{}</Play>", escape(url)));
                }
                Verb::Say(text) => {
                    xml.push_str(&format!("<Say>{}</Say>", escape(text)));
                }
                Verb::Gather { action, window } => {
                    xml.push_str(&format!(
                        "<Gather input=\"speech\" action=\"{}\" method=\"POST\" \
                         speechTimeout=\"{}\" timeout=\"{}\"/>",
                        escape(action),
                        window.speech_timeout_secs,
                        window.timeout_secs
                    ));
                }
                Verb::Redirect(url) => {
                    xml.push_str(&format!(
                        "<Redirect method=\"POST\">{}</Redirect>",
                        escape(url)
                    ));
                }
                Verb::Pause(length) => {
                    xml.push_str(&format!("<Pause length=\"{length}\"/>"));
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/xml")],
            self.to_xml(),
        )
            .into_response()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
