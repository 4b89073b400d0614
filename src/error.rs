//! Error types for the mail digest pipeline.
//!
//! Every pipeline stage absorbs its own failures and substitutes a fallback
//! value, so these types mostly travel as far as the stage boundary and are
//! logged there. Only configuration and backend setup errors reach the binary.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Inference backend errors. Any of these means "backend unavailable".
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote mail source errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Mail source {source_name} request failed: {reason}")]
    RequestFailed { source_name: String, reason: String },

    #[error("Authentication failed for mail source {source_name}")]
    AuthFailed { source_name: String },

    #[error("Invalid response from mail source {source_name}: {reason}")]
    InvalidResponse { source_name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Cache document read/write errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error on cache {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error on cache {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
