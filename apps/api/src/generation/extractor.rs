//! Response extractor — pulls the generated text out of a completion body.
//!
//! Two candidate shapes are recognised, tried in order:
//! 1. chat:   `{"choices": [{"message": {"content": "..."}}]}`
//! 2. legacy: `{"choices": [{"text": "..."}]}`
//!
//! Anything else is an `ExtractionFailure`, a normal outcome the caller
//! handles the same way as a transport failure.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::RawCompletion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("response has no choices list (top-level keys: {top_level_keys:?})")]
    MissingChoices { top_level_keys: Vec<String> },

    #[error("response choices list is empty")]
    EmptyChoices,

    #[error("first choice has no text (choice keys: {choice_keys:?}, message keys: {message_keys:?})")]
    NoText {
        choice_keys: Vec<String>,
        message_keys: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct Candidates {
    choices: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MessageCandidate {
    message: MessageBody,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextCandidate {
    text: Option<String>,
}

/// Returns the trimmed, non-empty text of the first choice. Pure: the same
/// body always yields the same result.
pub fn extract(raw: &RawCompletion) -> Result<String, ExtractionFailure> {
    let body = raw.body();

    let candidates = Candidates::deserialize(body).map_err(|_| ExtractionFailure::MissingChoices {
        top_level_keys: keys_of(body),
    })?;
    let first = candidates
        .choices
        .first()
        .ok_or(ExtractionFailure::EmptyChoices)?;

    if let Ok(candidate) = MessageCandidate::deserialize(first) {
        if let Some(text) = non_empty(candidate.message.content) {
            return Ok(text);
        }
    }

    if let Ok(candidate) = TextCandidate::deserialize(first) {
        if let Some(text) = non_empty(candidate.text) {
            return Ok(text);
        }
    }

    Err(ExtractionFailure::NoText {
        choice_keys: keys_of(first),
        message_keys: first.get("message").map(keys_of).unwrap_or_default(),
    })
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn keys_of(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}
