// src/error.rs

//! Unified error handling for the stormwatch application.

use std::fmt;

use thiserror::Error;

/// Result type alias for stormwatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream feed could not be reached (network/HTTP failure)
    #[error("Upstream unavailable for {context}: {message}")]
    UpstreamUnavailable { context: String, message: String },

    /// Upstream payload could not be parsed into the expected shape
    #[error("Upstream format error for {context}: {message}")]
    UpstreamFormat { context: String, message: String },

    /// Forecast oracle call failed or returned unusable content
    #[error("Prediction unavailable: {0}")]
    PredictionUnavailable(String),

    /// Unknown entity or record id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Create an upstream-unavailable error with context.
    pub fn upstream(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an upstream-format error with context.
    pub fn format(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::UpstreamFormat {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a prediction-unavailable error.
    pub fn prediction(message: impl Into<String>) -> Self {
        Self::PredictionUnavailable(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error belongs to the recoverable ingestion taxonomy.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::UpstreamFormat { .. }
        )
    }
}
