//! Single-shot generation — the non-streaming sibling of the controller.
//!
//! Makes exactly one attempt per requested review with no retry budget.
//! Unusable responses are skipped; a transport failure fails the request.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::composer::compose;
use crate::generation::extractor::extract;
use crate::generation::params::draw;
use crate::llm_client::CompletionClient;

pub async fn generate_batch(
    client: &dyn CompletionClient,
    description: &str,
    count: usize,
) -> Result<Vec<String>, AppError> {
    let mut rng = StdRng::from_entropy();
    let mut reviews = Vec::with_capacity(count);

    for attempt in 1..=count {
        let params = draw(&mut rng);
        let prompt = compose(&params, description)?;

        let raw = client
            .complete(&prompt.system_instruction, &prompt.user_instruction)
            .await
            .map_err(|e| AppError::Llm(format!("Batch attempt {attempt}/{count} failed: {e}")))?;

        match extract(&raw) {
            Ok(review) => reviews.push(review),
            Err(failure) => warn!("Batch attempt {attempt}/{count} skipped: {failure}"),
        }
    }

    info!("Batch generation produced {}/{} reviews", reviews.len(), count);
    Ok(reviews)
}
