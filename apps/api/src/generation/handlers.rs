//! Axum route handlers for the Generation API.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tracing::debug;

use crate::errors::AppError;
use crate::generation::batch::generate_batch;
use crate::generation::controller::{clamp_count, ReviewController};
use crate::generation::events::StreamEmitter;
use crate::restaurant::load_description;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub content: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub reviews: Vec<String>,
}

/// Reads the `count` query value. Absent or unparseable means 1; clamping
/// happens in the controller.
pub fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/generate-stream?count=N
///
/// Streams `total`, one `review` per success, then `completed` (preceded by
/// `error` if nothing was generated) as `text/event-stream`.
/// Configuration problems are returned as a plain error before the stream opens.
pub async fn handle_generate_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let client = state.completion_client()?;
    let description = load_description(&state.config.restaurant_config_path).await;
    let controller = ReviewController::new(parse_count(query.count.as_deref()), description)?;

    let (emitter, rx) = StreamEmitter::channel();
    tokio::spawn(async move {
        // dropping the emitter at the end of the task closes the stream
        let outcome = controller.run(client.as_ref(), &emitter).await;
        debug!(
            generated = outcome.generated,
            requested = outcome.requested,
            attempts = outcome.attempts_made,
            cancelled = outcome.cancelled,
            "Stream task finished"
        );
    });

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST /api/generate
///
/// Non-streaming batch generation. Uses `content` as the description when
/// given, otherwise the configured description file.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let client = state.completion_client()?;

    let description = match request.content {
        Some(content) if !content.trim().is_empty() => content,
        _ => load_description(&state.config.restaurant_config_path).await,
    };
    let count = clamp_count(request.count.unwrap_or(1));

    let reviews = generate_batch(client.as_ref(), &description, count).await?;

    Ok(Json(GenerateResponse { reviews }))
}
