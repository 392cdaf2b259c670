//! The dialogue controller: one webhook turn in, one decision out.

use crate::completion::{CompletionBackend, SYSTEM_PROMPT};
use crate::{contract, intent};
use orderline_session::SessionStore;
use orderline_types::{OrderAction, Turn};
use orderline_voice::SpeechSynthesizer;
use std::sync::Arc;

/// Hard cap on caller-facing spoken text.
pub const MAX_SPOKEN_CHARS: usize = 300;

/// Spoken when the completion service fails or the session write fails.
pub const APOLOGY: &str =
    "Sorry, I had trouble. Please say your order again with the item and size.";

/// Spoken when the caller asks for a change inside the finalize window.
pub const CHANGE_ACK: &str = "No problem, what would you like to change?";

/// Spoken before hanging up.
pub const GOODBYE: &str = "Goodbye.";

/// The next call-control instruction for this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Nothing usable was heard; capture another utterance.
    Reprompt,
    /// Speak the reply, then return to the normal capture loop.
    ContinueLoop,
    /// Speak the reply, then open the short change-your-mind window.
    FinalizeWindow,
}

/// The controller's decision for one request. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueOutcome {
    /// Text to speak; `None` only for [`NextStep::Reprompt`].
    pub say_text: Option<String>,
    /// Relative URL of the synthesized clip, when synthesis succeeded.
    /// `None` means "speak the text with the basic fallback voice".
    pub audio: Option<String>,
    pub next: NextStep,
}

/// Decision at the finalize confirmation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The caller wants to amend the order; re-enter the normal loop
    /// with the session retained.
    Reopen { say_text: String },
    /// Goodbye: session cleared, call over.
    End { say_text: String },
}

/// Orchestrates one call event: session load, completion, contract
/// parse, synthesis, session write, next-instruction decision.
pub struct DialogueController {
    completion: Arc<dyn CompletionBackend>,
    speech: Arc<dyn SpeechSynthesizer>,
    sessions: Arc<dyn SessionStore>,
}

impl DialogueController {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        speech: Arc<dyn SpeechSynthesizer>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            completion,
            speech,
            sessions,
        }
    }

    /// Handles one normal conversation turn. Never fails: every adapter
    /// error degrades into a spoken sentence and a valid next step.
    pub async fn handle_turn(&self, call_id: &str, transcript: &str) -> DialogueOutcome {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            // Silence or no recognizer result: capture again, touch nothing.
            return DialogueOutcome {
                say_text: None,
                audio: None,
                next: NextStep::Reprompt,
            };
        }

        let history = match self.sessions.get(call_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(call_id, "session read failed, starting fresh: {e}");
                Vec::new()
            }
        };

        // The stored history never contains the system instruction; it is
        // prepended transiently to each request.
        let mut request = Vec::with_capacity(history.len() + 2);
        request.push(Turn::system(SYSTEM_PROMPT));
        request.extend(history.iter().cloned());
        request.push(Turn::user(transcript));

        let mut reply = None;
        let say_text = match self.completion.complete(&request).await {
            Ok(raw) => {
                // Persist exactly what the model saw and said, before any
                // downstream degradation. Parsing and synthesis outcomes
                // must not affect session continuity.
                let mut updated = history;
                updated.push(Turn::user(transcript));
                updated.push(Turn::assistant(raw.clone()));
                match self.sessions.set(call_id, &updated).await {
                    Ok(()) => {
                        reply = contract::parse_agent_reply(&raw);
                        match &reply {
                            Some(agent) => agent.say_text.trim().to_string(),
                            None => {
                                tracing::warn!(
                                    call_id,
                                    "completion output failed the reply contract, speaking raw text"
                                );
                                raw.trim().to_string()
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(call_id, "session write failed: {e}");
                        APOLOGY.to_string()
                    }
                }
            }
            Err(e) => {
                tracing::warn!(call_id, "completion call failed: {e}");
                APOLOGY.to_string()
            }
        };

        let say_text = cap_spoken_text(&say_text, MAX_SPOKEN_CHARS);

        let audio = match self.speech.synthesize(&say_text).await {
            Ok(clip) => Some(clip.url_path),
            Err(e) => {
                tracing::warn!(call_id, "synthesis failed, using fallback voice: {e}");
                None
            }
        };

        let next = match &reply {
            Some(agent) if agent.action == OrderAction::Finalize => NextStep::FinalizeWindow,
            _ => NextStep::ContinueLoop,
        };

        DialogueOutcome {
            say_text: Some(say_text),
            audio,
            next,
        }
    }

    /// Handles the transcript captured inside the finalize window. A
    /// change request re-opens the ordering loop; anything else
    /// (including silence) ends the call and clears the session.
    pub async fn handle_finalize(&self, call_id: &str, transcript: &str) -> FinalizeOutcome {
        if intent::wants_change(transcript) {
            return FinalizeOutcome::Reopen {
                say_text: CHANGE_ACK.to_string(),
            };
        }

        // A store error at hangup time must never keep the call alive.
        if let Err(e) = self.sessions.delete(call_id).await {
            tracing::warn!(call_id, "session delete failed at hangup, ignoring: {e}");
        }
        FinalizeOutcome::End {
            say_text: GOODBYE.to_string(),
        }
    }
}

/// Applies the hard spoken-text cap: truncate to `max_chars`, then trim
/// back to the last sentence boundary within the truncated text and
/// re-attach a single period. With no boundary in range, truncate hard
/// with no added punctuation.
pub fn cap_spoken_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind('.') {
        Some(idx) => {
            let head = truncated[..idx].trim_end();
            if head.is_empty() {
                truncated
            } else {
                format!("{head}.")
            }
        }
        None => truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(cap_spoken_text("Anything else?", 300), "Anything else?");
    }

    #[test]
    fn exactly_at_the_cap_is_untouched() {
        let text = "a".repeat(300);
        assert_eq!(cap_spoken_text(&text, 300), text);
    }

    #[test]
    fn long_text_trims_to_the_last_sentence_boundary() {
        let text = format!("First sentence. Second sentence. {}", "x".repeat(300));
        let capped = cap_spoken_text(&text, 300);
        assert_eq!(capped, "First sentence. Second sentence.");
        assert!(capped.chars().count() <= 300);
        assert!(capped.ends_with('.'));
        assert!(!capped.ends_with(".."));
    }

    #[test]
    fn no_boundary_means_a_hard_cut() {
        let text = "y".repeat(400);
        let capped = cap_spoken_text(&text, 300);
        assert_eq!(capped.chars().count(), 300);
        assert!(!capped.ends_with('.'));
    }

    #[test]
    fn leading_period_falls_back_to_the_hard_cut() {
        let text = format!(".{}", "z".repeat(400));
        let capped = cap_spoken_text(&text, 300);
        assert_eq!(capped.chars().count(), 300);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let text = "é".repeat(400);
        let capped = cap_spoken_text(&text, 300);
        assert_eq!(capped.chars().count(), 300);
    }
}
