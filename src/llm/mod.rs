//! LLM integration.
//!
//! The pipeline only needs plain chat completion, so the surface is a single
//! `LlmProvider::complete` call. The shipped backend is a local Ollama
//! daemon; tests substitute their own providers.

pub mod extract;
pub mod ollama;
pub mod provider;

pub use ollama::OllamaProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Ollama => {
            let provider = OllamaProvider::new(&config.base_url, &config.model, config.timeout)?;
            tracing::info!("Using Ollama at {} (model: {})", config.base_url, config.model);
            Ok(Arc::new(provider))
        }
    }
}
