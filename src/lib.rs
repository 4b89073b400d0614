//! Mail digest: fetch, classify and summarize recent email with a local LLM.

pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod store;
