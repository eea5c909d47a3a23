use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::errors::AppError;
use crate::llm_client::CompletionClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The completion backend, or the reason it could not be configured at startup.
    /// Requests that need it fail with that reason before doing any work.
    pub llm: Result<Arc<dyn CompletionClient>, ConfigError>,
    pub config: Config,
}

impl AppState {
    pub fn completion_client(&self) -> Result<Arc<dyn CompletionClient>, AppError> {
        self.llm.clone().map_err(AppError::from)
    }
}
