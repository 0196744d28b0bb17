//! Error types for the phishing detector.
//!
//! All library operations return [`Result<T>`], an alias over [`DetectorError`].
//! Prediction itself never fails; errors come from loading data, fitting the
//! pipeline, reading configuration, or (de)serializing the model artifact.

use std::io;

use thiserror::Error;

/// The main error type for training, persistence and configuration.
#[derive(Error, Debug)]
pub enum DetectorError {
    /// I/O errors (unreadable input, unwritable artifact path, ...)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed TOML configuration
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON report serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model artifact could not be encoded or decoded
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// A required column is absent from the training data header
    #[error("Missing required column '{0}' in training data")]
    MissingColumn(String),

    /// Nothing left to train on (after dropping incomplete rows or sampling)
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Vectorizer fit failures (e.g. every term pruned by document frequency)
    #[error("Vectorizer error: {0}")]
    Vectorizer(String),

    /// Configuration values outside their valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A training-only stage was invoked outside training
    #[error("Invalid pipeline mode: {0}")]
    InvalidMode(String),

    /// A stage was applied before being fitted
    #[error("Stage '{0}' used before fit")]
    NotFitted(&'static str),
}

/// Result type alias for operations that may fail with [`DetectorError`].
pub type Result<T> = std::result::Result<T, DetectorError>;

impl DetectorError {
    /// Create a new artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        DetectorError::Artifact(msg.into())
    }

    /// Create a new invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        DetectorError::InvalidConfig(msg.into())
    }

    /// Create a new vectorizer error.
    pub fn vectorizer<S: Into<String>>(msg: S) -> Self {
        DetectorError::Vectorizer(msg.into())
    }

    /// Create a new empty dataset error.
    pub fn empty_dataset<S: Into<String>>(msg: S) -> Self {
        DetectorError::EmptyDataset(msg.into())
    }
}

impl From<bincode::Error> for DetectorError {
    fn from(err: bincode::Error) -> Self {
        DetectorError::Artifact(err.to_string())
    }
}
