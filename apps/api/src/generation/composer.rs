//! Prompt composer — renders attempt parameters and the restaurant
//! description into the system/user instruction pair sent to the LLM.

use crate::config::ConfigError;
use crate::generation::params::AttemptParameters;
use crate::generation::prompts::{
    MIXED_CLAUSE, POSITIVE_CLAUSE, REVIEW_SYSTEM_TEMPLATE, REVIEW_USER_TEMPLATE,
};
use crate::llm_client::prompts::PLAIN_TEXT_ONLY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_instruction: String,
    pub user_instruction: String,
}

/// Builds the prompt pair. Deterministic for a given input.
///
/// An empty description is a configuration problem, not an attempt failure;
/// the controller never reaches this with one because the handler rejects
/// the request first.
pub fn compose(params: &AttemptParameters, description: &str) -> Result<PromptPair, ConfigError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ConfigError::EmptyDescription);
    }

    let sentiment_clause = if params.include_negative_sentiment {
        MIXED_CLAUSE
    } else {
        POSITIVE_CLAUSE
    };

    let system_instruction = REVIEW_SYSTEM_TEMPLATE.replace("{plain_text_only}", PLAIN_TEXT_ONLY);

    // description goes last so braces inside it are never treated as placeholders
    let user_instruction = REVIEW_USER_TEMPLATE
        .replace("{role}", params.role)
        .replace("{scene}", params.scene)
        .replace("{style}", params.style)
        .replace("{casual_expression}", params.casual_expression)
        .replace("{filler_word}", params.filler_word)
        .replace("{closing_phrase}", params.closing_phrase)
        .replace("{sentiment_clause}", sentiment_clause)
        .replace("{description}", description);

    Ok(PromptPair {
        system_instruction,
        user_instruction,
    })
}
