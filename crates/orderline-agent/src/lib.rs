//! The call-session dialogue controller for the Orderline platform.
//!
//! This crate is the core of the system: it turns one inbound speech
//! transcript into an updated order cart, a spoken reply, and the next
//! call-control decision, while keeping the conversation history alive
//! across the stateless webhook round trips the telephony provider
//! imposes.
//!
//! The controller is infallible by construction. Both external services
//! (chat completion and speech synthesis) can fail independently, and
//! every failure is absorbed into a spoken sentence: a completion
//! failure becomes a fixed apology with the history left untouched, a
//! contract violation becomes the raw model text spoken as-is, and a
//! synthesis failure falls back to the telephony provider's basic
//! voice. No failure ever ends the call.

pub mod completion;
pub mod contract;
pub mod dialogue;
pub mod intent;

pub use completion::{
    CompletionBackend, CompletionConfig, CompletionError, OpenAiCompletion, SYSTEM_PROMPT,
};
pub use contract::parse_agent_reply;
pub use dialogue::{
    cap_spoken_text, DialogueController, DialogueOutcome, FinalizeOutcome, NextStep, APOLOGY,
    CHANGE_ACK, GOODBYE, MAX_SPOKEN_CHARS,
};
pub use intent::wants_change;
