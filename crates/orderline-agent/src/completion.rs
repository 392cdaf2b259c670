//! Chat-completion adapter.
//!
//! Sends the conversation transcript plus the fixed system instruction
//! to a chat-completion service and returns the raw reply text. The
//! reply is *expected* to be a JSON object matching the advertised
//! schema; enforcing that is [`crate::contract`]'s job, not this one's.

use async_trait::async_trait;
use orderline_types::Turn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External-call budget for one completion request.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of a provider error body to keep in the error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// The fixed instruction advertised to the completion service. The
/// JSON schema here is the contract [`crate::contract`] validates
/// against; the two load-bearing keys are `say_text` and `action`.
pub const SYSTEM_PROMPT: &str = "\
You are OrderPilot, a professional phone agent for Captain Sam's Fish & Chicken.
Only take food pickup orders. Keep answers short and precise. No greetings.
Output must be STRICT JSON with keys: cart, customer_name, action, say_text.
Schema:
{
  \"cart\": [
    {\"item\": \"3pc Fish Dinner\", \"qty\": 1, \"size\": \"large\", \"sides\": [\"fries\"], \"sauces\": [\"tartar\"]}
  ],
  \"customer_name\": \"optional string\",
  \"action\": \"continue|confirm|finalize\",
  \"say_text\": \"Short sentence to speak next (<= 200 chars).\"
}
Rules:
- Never suggest items unless the customer asks.
- If customer mentions an item, confirm size/sauce/side briefly.
- For confirm step: repeat order once, ask once if anything else.
- For finalize: return action=\"finalize\" and include a brief say_text like \
\"Your order is confirmed. Please pick up in 15-20 minutes.\"
Respond with JSON only. No extra text.";

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion failed: {status} {message}")]
    Status { status: u16, message: String },

    #[error("malformed completion payload: {0}")]
    Malformed(String),
}

/// Sends a transcript to a language-completion service and returns the
/// raw reply text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, CompletionError>;
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Connection settings for the OpenAI chat-completions API.
#[derive(Clone, Deserialize)]
pub struct CompletionConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// OpenAI chat-completions backend. Requests JSON-object output mode so
/// the model is steered toward the contract before parsing ever runs.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiCompletion {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, CompletionError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: transcript,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let message: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(ERROR_BODY_EXCERPT)
                .collect();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("response has no choices".to_string()))?;
        Ok(choice.message.content)
    }
}
