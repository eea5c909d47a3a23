/// LLM Client — the single point of entry for all completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// All LLM interactions MUST go through a `CompletionClient`.
///
/// One call is one attempt. Retrying is the caller's decision (see
/// `generation::controller`), so this client never loops internally.
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CompletionSettings;

pub mod prompts;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
/// Sampling temperature is drawn from `[MIN_TEMPERATURE, MIN_TEMPERATURE + TEMPERATURE_SPREAD)`.
const MIN_TEMPERATURE: f32 = 0.8;
const TEMPERATURE_SPREAD: f32 = 0.2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {millis}ms")]
    Timeout { millis: u128 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Untouched response body from the completion service.
///
/// The shape is not fixed across providers; reading text out of it is the
/// job of `generation::extractor`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCompletion(Value);

impl RawCompletion {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &Value {
        &self.0
    }
}

/// A completion backend. Carried in `AppState` as `Arc<dyn CompletionClient>`
/// so handlers and the controller never depend on the transport.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<RawCompletion, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(settings: CompletionSettings) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            endpoint: chat_completions_url(&settings.base_url),
            api_key: settings.api_key,
            model: settings.model,
            timeout: settings.timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<RawCompletion, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: MIN_TEMPERATURE + rand::thread_rng().gen::<f32>() * TEMPERATURE_SPREAD,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let value: Value = serde_json::from_str(&body)?;

        debug!("Completion call succeeded ({} bytes)", body.len());

        Ok(RawCompletion::new(value))
    }
}

impl OpenAiClient {
    fn classify(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                millis: self.timeout.as_millis(),
            }
        } else {
            LlmError::Http(err)
        }
    }
}

/// Builds the chat-completions URL from a configured base address.
/// `https://host` and `https://host/v1/` both become `https://host/v1/chat/completions`.
fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    } else {
        format!("{base}/v1{CHAT_COMPLETIONS_PATH}")
    }
}
