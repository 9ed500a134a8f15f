// src/error.rs

//! Unified error handling for the playlist synchronizer.

use std::fmt;

use thiserror::Error;

use crate::pipeline::SyncPhase;

/// Result type alias for synchronizer operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Base64 credential blob could not be decoded
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were rejected by a provider
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Provider returned a non-success response
    #[error("API error for {context} (status {status}): {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// A synchronization run aborted before completing
    #[error("Sync aborted ({phase}): {source}")]
    Sync {
        phase: SyncPhase,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authorization error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a provider API error with context.
    pub fn api(context: impl Into<String>, status: u16, message: impl fmt::Display) -> Self {
        Self::Api {
            context: context.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Wrap an error with the phase a sync run stopped in.
    pub fn sync(phase: SyncPhase, source: AppError) -> Self {
        Self::Sync {
            phase,
            source: Box::new(source),
        }
    }

    /// Whether this error came from missing or malformed configuration.
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Base64(_) | Self::Url(_) => true,
            Self::Sync { source, .. } => source.is_config(),
            _ => false,
        }
    }

    /// The sync phase this error aborted, if it came from a sync run.
    pub fn phase(&self) -> Option<SyncPhase> {
        match self {
            Self::Sync { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
