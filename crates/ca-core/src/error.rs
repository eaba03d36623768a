//! Error types for ca-core

use thiserror::Error;

/// Main error type for ca-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM API error: {0}")]
    Upstream(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No LLM API key configured")]
    MissingCredential,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ca-core
pub type Result<T> = std::result::Result<T, Error>;
