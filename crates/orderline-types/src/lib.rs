//! Shared conversation and order types for the Orderline platform.
//!
//! This crate provides the foundational types used across all Orderline
//! crates: conversation turns as stored in the session store and sent to
//! the chat-completion provider, and the typed agent reply the completion
//! service is contracted to produce.
//!
//! No crate in the workspace depends on anything *except*
//! `orderline-types` for cross-cutting type definitions. This keeps the
//! dependency graph clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// The speaker of a conversation turn.
///
/// Serialized lowercase so a stored history is directly the
/// chat-completions wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The fixed instruction describing the agent's job and output schema.
    /// Never stored; prepended transiently to each completion request.
    System,
    /// A caller utterance (speech-recognizer transcript).
    User,
    /// A reply produced by the completion service.
    Assistant,
}

/// One role-tagged entry in a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What the agent wants to happen next in the ordering conversation.
///
/// Advisory beyond the `Finalize` branch: only `finalize` changes the
/// call-control flow, the rest shape the conversation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    /// Keep taking the order.
    #[default]
    Continue,
    /// The agent is reading the order back for confirmation.
    Confirm,
    /// The order is confirmed; open the change-your-mind window.
    Finalize,
}

/// One line item in the running order cart.
///
/// Every field is defaulted and unknown sub-fields are preserved in
/// `extra`: the cart's semantic correctness is delegated entirely to the
/// completion service's adherence to the advertised schema, so shape
/// drift here must never invalidate a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartItem {
    pub item: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
    pub size: Option<String>,
    pub sides: Vec<String>,
    pub sauces: Vec<String>,
    /// Sub-fields the schema does not name, passed through as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_qty() -> u32 {
    1
}

impl Default for CartItem {
    fn default() -> Self {
        Self {
            item: String::new(),
            qty: default_qty(),
            size: None,
            sides: Vec::new(),
            sauces: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The validated result of one completion round.
///
/// `cart` is the completion service's running understanding of the whole
/// order, not a local accumulator: each turn replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub action: OrderAction,
    /// Short caller-facing sentence to speak next.
    pub say_text: String,
}
