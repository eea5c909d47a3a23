use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{error, info, warn};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_DESCRIPTION_PATH: &str = "restaurant.txt";
const OFFICIAL_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
///
/// Completion-service values are optional at load time so the service can
/// still boot and report what is missing; `completion_settings()` is the
/// gate every generation request goes through.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub openai_timeout: Duration,
    /// Raw `OPENAI_TIMEOUT` value that failed to parse. Reported by `log_status()`,
    /// since config loads before the subscriber exists.
    pub invalid_timeout: Option<String>,
    pub restaurant_config_path: String,
    pub port: u16,
    pub rust_log: String,
}

/// Validated settings for talking to the completion service.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("OPENAI_BASE_URL is not set")]
    MissingBaseUrl,

    #[error("OPENAI_BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(String),

    #[error("OPENAI_MODEL is not set")]
    MissingModel,

    #[error("Restaurant description is empty")]
    EmptyDescription,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let (openai_timeout, invalid_timeout) =
            parse_timeout(optional_env("OPENAI_TIMEOUT").as_deref());

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            openai_model: optional_env("OPENAI_MODEL"),
            openai_timeout,
            invalid_timeout,
            restaurant_config_path: optional_env("RESTAURANT_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION_PATH.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Checks the completion-service values and returns them as one unit.
    pub fn completion_settings(&self) -> Result<CompletionSettings, ConfigError> {
        let api_key = self
            .openai_api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey)?;
        let base_url = self
            .openai_base_url
            .clone()
            .ok_or(ConfigError::MissingBaseUrl)?;
        reqwest::Url::parse(&base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.clone()))?;
        let model = self.openai_model.clone().ok_or(ConfigError::MissingModel)?;

        Ok(CompletionSettings {
            api_key,
            base_url,
            model,
            timeout: self.openai_timeout,
        })
    }

    /// Logs which completion-service settings are present. Never logs the key itself.
    pub fn log_status(&self) {
        match &self.openai_api_key {
            Some(key) => info!("OpenAI API key detected (length: {})", key.len()),
            None => error!("Missing OpenAI API key (OPENAI_API_KEY)"),
        }

        match &self.openai_base_url {
            Some(url) if url.trim_end_matches('/') != OFFICIAL_BASE_URL => {
                info!("Using third-party completion endpoint: {url}")
            }
            Some(url) => info!("Using completion endpoint: {url}"),
            None => error!("Missing completion base URL (OPENAI_BASE_URL)"),
        }

        match &self.openai_model {
            Some(model) => info!("Completion model: {model}"),
            None => error!("Missing completion model (OPENAI_MODEL)"),
        }

        if let Some(warning) = self.timeout_warning() {
            warn!("{warning}");
        }

        info!(
            "Per-call timeout: {}ms, description file: {}",
            self.openai_timeout.as_millis(),
            self.restaurant_config_path
        );
    }

    fn timeout_warning(&self) -> Option<String> {
        self.invalid_timeout.as_ref().map(|raw| {
            format!(
                "Invalid OPENAI_TIMEOUT '{raw}', using {}ms",
                self.openai_timeout.as_millis()
            )
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the timeout to use and, when the raw value was unparseable, that value.
fn parse_timeout(raw: Option<&str>) -> (Duration, Option<String>) {
    let default = Duration::from_millis(DEFAULT_TIMEOUT_MS);
    match raw {
        None => (default, None),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) => (Duration::from_millis(ms), None),
            Err(_) => (default, Some(value.to_string())),
        },
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: Some("https://llm.example.com".to_string()),
        openai_model: Some("gpt-4o-mini".to_string()),
        openai_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        invalid_timeout: None,
        restaurant_config_path: DEFAULT_DESCRIPTION_PATH.to_string(),
        port: 8080,
        rust_log: "info".to_string(),
    }
}
