//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default local inference endpoint.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default model used for classification and summaries.
pub const DEFAULT_MODEL: &str = "deepseek-r1:8b";

/// Default Gmail REST endpoint.
pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Mail agent configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct MailAgentConfig {
    /// Base URL of the Ollama server.
    pub ollama_host: String,
    /// Model name passed to the inference backend.
    pub model: String,
    /// Per-call HTTP timeout for inference requests.
    pub llm_timeout: Duration,
    /// Directory holding the snapshot and classified-email caches.
    pub data_dir: PathBuf,
    /// Directory that digest documents are written into.
    pub digest_dir: PathBuf,
    /// Gmail OAuth bearer token. `None` means remote fetch is impossible and
    /// only the snapshot cache can serve messages.
    pub gmail_token: Option<SecretString>,
    /// Gmail REST base URL.
    pub gmail_api_base: String,
    /// Upper bound on messages listed per fetch.
    pub max_messages: usize,
}

impl Default for MailAgentConfig {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            llm_timeout: Duration::from_secs(300),
            data_dir: PathBuf::from("."),
            digest_dir: PathBuf::from("mail_digests"),
            gmail_token: None,
            gmail_api_base: DEFAULT_GMAIL_API_BASE.to_string(),
            max_messages: 500,
        }
    }
}

impl MailAgentConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ollama_host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.ollama_host);
        let model = std::env::var("MAIL_AGENT_MODEL").unwrap_or(defaults.model);

        let llm_timeout = match std::env::var("MAIL_AGENT_LLM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse_positive("MAIL_AGENT_LLM_TIMEOUT_SECS", &raw)?),
            Err(_) => defaults.llm_timeout,
        };

        let data_dir = std::env::var("MAIL_AGENT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let digest_dir = std::env::var("MAIL_AGENT_DIGEST_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.digest_dir);

        let gmail_token = std::env::var("GMAIL_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);
        let gmail_api_base =
            std::env::var("GMAIL_API_BASE").unwrap_or(defaults.gmail_api_base);

        let max_messages = match std::env::var("MAIL_AGENT_MAX_MESSAGES") {
            Ok(raw) => parse_positive("MAIL_AGENT_MAX_MESSAGES", &raw)? as usize,
            Err(_) => defaults.max_messages,
        };

        Ok(Self {
            ollama_host,
            model,
            llm_timeout,
            data_dir,
            digest_dir,
            gmail_token,
            gmail_api_base,
            max_messages,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
