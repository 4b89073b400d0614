//! Mail agent: sequences fetch, classification and summaries.
//!
//! Every public operation shares one caching decision:
//!
//! 1. `allow_cache` and a non-empty classified-email cache → use it as-is,
//!    the classifier is never called.
//! 2. Otherwise fetch (same `allow_cache` flag), classify each message,
//!    enrich as the operation requires, then persist the records.
//!
//! Persisting happens after enrichment, so the saved cache always carries
//! every summary the caller received. Cache read failures count as a miss;
//! save failures are logged and ignored.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::provider::LlmProvider;
use crate::mail::MailSource;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::digest::DigestWriter;
use crate::pipeline::summarizer::Summarizer;
use crate::pipeline::types::ClassifiedEmail;
use crate::store::{DocumentStore, load_typed, save_typed};

/// Store key of the classified-email cache.
pub const CLASSIFIED_CACHE_KEY: &str = "classified_emails";

/// The pipeline orchestrator. Owns the classified-email cache.
pub struct MailAgent {
    source: Arc<dyn MailSource>,
    store: Arc<dyn DocumentStore>,
    classifier: Classifier,
    summarizer: Summarizer,
}

impl MailAgent {
    pub fn new(
        source: Arc<dyn MailSource>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn DocumentStore>,
        digest_writer: DigestWriter,
    ) -> Self {
        Self {
            source,
            store,
            classifier: Classifier::new(llm.clone()),
            summarizer: Summarizer::new(llm, digest_writer),
        }
    }

    async fn load_cache(&self, allow_cache: bool) -> Option<Vec<ClassifiedEmail>> {
        if !allow_cache {
            return None;
        }
        match load_typed::<Vec<ClassifiedEmail>>(self.store.as_ref(), CLASSIFIED_CACHE_KEY).await
        {
            Ok(Some(records)) if !records.is_empty() => {
                info!(count = records.len(), "Using cached classifications");
                Some(records)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load classified-email cache, treating as miss");
                None
            }
        }
    }

    async fn save_cache(&self, records: &[ClassifiedEmail]) {
        match save_typed(self.store.as_ref(), CLASSIFIED_CACHE_KEY, records).await {
            Ok(()) => info!(count = records.len(), "Saved classified-email cache"),
            Err(e) => warn!(error = %e, "Failed to save classified-email cache"),
        }
    }

    async fn fetch_and_classify(&self, hours: u32, allow_cache: bool) -> Vec<ClassifiedEmail> {
        let messages = self.source.fetch(hours, allow_cache).await;
        self.classifier.classify_all(messages).await
    }

    /// Give `record` a summary if it lacks one. Returns whether one was
    /// computed.
    pub async fn ensure_summary(&self, record: &mut ClassifiedEmail) -> bool {
        self.summarizer.ensure_summary(record).await
    }

    /// Period report over the last `hours`. On a miss, records are
    /// classified but not individually summarized before saving.
    pub async fn process_recent(&self, hours: u32, allow_cache: bool) -> String {
        let records = match self.load_cache(allow_cache).await {
            Some(records) => records,
            None => {
                let records = self.fetch_and_classify(hours, allow_cache).await;
                self.save_cache(&records).await;
                records
            }
        };
        self.summarizer.summarize_period(&records, hours).await
    }

    /// Records with `importance_score > 0.7` or `requires_action`, each
    /// carrying a summary.
    pub async fn get_important(&self, hours: u32, allow_cache: bool) -> Vec<ClassifiedEmail> {
        let (mut records, mut dirty) = match self.load_cache(allow_cache).await {
            Some(records) => (records, false),
            None => (self.fetch_and_classify(hours, allow_cache).await, true),
        };

        for record in records.iter_mut().filter(|r| r.is_important()) {
            if self.ensure_summary(record).await {
                dirty = true;
            }
        }

        if dirty {
            self.save_cache(&records).await;
        }

        let important: Vec<ClassifiedEmail> =
            records.into_iter().filter(|r| r.is_important()).collect();
        info!(count = important.len(), hours, "Selected important emails");
        important
    }

    /// Render (and write) the daily digest. On a miss every record is
    /// summarized before saving; on a hit cached records are rendered
    /// as they are.
    pub async fn generate_daily_digest(&self, hours: u32, allow_cache: bool) -> String {
        let records = match self.load_cache(allow_cache).await {
            Some(records) => records,
            None => {
                let mut records = self.fetch_and_classify(hours, allow_cache).await;
                for record in records.iter_mut() {
                    self.ensure_summary(record).await;
                }
                self.save_cache(&records).await;
                records
            }
        };
        self.summarizer.generate_digest(&records, hours).await
    }

    /// Detailed analysis of one record.
    pub async fn analyze_email(&self, record: &ClassifiedEmail) -> String {
        self.summarizer.analyze(&record.message).await
    }
}
