//! Axum route handlers for the Optimize API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::optimize::optimize_text;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub optimized_content: String,
}

/// POST /api/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let client = state.completion_client()?;
    let optimized_content = optimize_text(client.as_ref(), &request.content).await?;
    Ok(Json(OptimizeResponse { optimized_content }))
}
