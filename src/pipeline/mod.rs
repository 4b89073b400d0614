//! Classification and summary pipeline.
//!
//! Data flows strictly downstream:
//! 1. `MailSource::fetch()`: messages for a time window
//! 2. `Classifier::classify()`: one classification per message
//! 3. `Summarizer`: per-message summaries, period report, digest
//!
//! `MailAgent` sequences the stages and owns the classified-email cache.
//! No stage failure aborts a run; each substitutes its documented fallback.

pub mod agent;
pub mod classifier;
pub mod digest;
pub mod summarizer;
pub mod types;

pub use agent::{CLASSIFIED_CACHE_KEY, MailAgent};
pub use classifier::Classifier;
pub use digest::DigestWriter;
pub use summarizer::Summarizer;
pub use types::{Category, Classification, ClassifiedEmail, PriorityLevel};
