//! Text optimization — one completion call that polishes a shop description.
//! No retry loop: a failed call fails the request.

pub mod handlers;
pub mod prompts;

use tracing::warn;

use crate::errors::AppError;
use crate::generation::extractor::extract;
use crate::llm_client::prompts::PLAIN_TEXT_ONLY;
use crate::llm_client::CompletionClient;
use crate::optimize::prompts::OPTIMIZE_SYSTEM_TEMPLATE;

pub async fn optimize_text(client: &dyn CompletionClient, content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let system = OPTIMIZE_SYSTEM_TEMPLATE.replace("{plain_text_only}", PLAIN_TEXT_ONLY);

    let raw = client
        .complete(&system, content)
        .await
        .map_err(|e| AppError::Llm(format!("Optimization call failed: {e}")))?;

    extract(&raw).map_err(|failure| {
        warn!("Optimization response unusable: {failure}");
        AppError::Llm(format!("Optimization response unusable: {failure}"))
    })
}
