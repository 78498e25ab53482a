//! Error types for the news relay pipeline
//!
//! Duplicates and empty selections are not errors; they are reported through
//! the outcome enums of each pipeline stage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    ApiError {
        code: String,
        message: String,
    },

    #[error("Provider response malformed: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Setting not configured: {0}")]
    MissingSetting(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PipelineError {
    /// Feed, provider or messaging endpoint unreachable or answering non-2xx.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::ApiError { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::ApiError { .. } => "api",
            Self::MalformedResponse(_) => "malformed",
            Self::Json(_) => "json",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::MissingSetting(_) => "missing_setting",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
