// src/error.rs

//! Unified error handling for the book triage application.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for book triage operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Backing file exists but cannot be interpreted
    #[error("Malformed book file {path}: {message}")]
    Parse { path: String, message: String },

    /// A record with this id is already in the collection
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// No record with this id
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Enrichment lookup failed
    #[error("Enrichment error: {0}")]
    Enrichment(String),
}

impl AppError {
    /// Create a malformed-file error for the given path.
    pub fn parse(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an enrichment error.
    pub fn enrichment(message: impl fmt::Display) -> Self {
        Self::Enrichment(message.to_string())
    }
}
