//! Snapshot-cached mail fetching.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::mail::{MailApi, MailSource, Message};
use crate::store::{DocumentStore, load_typed, save_typed};

/// Store key of the raw-message snapshot.
pub const SNAPSHOT_KEY: &str = "emails_cache";

/// `MailSource` that owns the mail snapshot cache.
///
/// - `allow_cache` + non-empty snapshot → snapshot, no remote call.
/// - Otherwise → remote fetch, snapshot fully replaced on success.
/// - Remote failure → snapshot (even when `allow_cache` is false), else empty.
pub struct MailFetcher {
    api: Arc<dyn MailApi>,
    store: Arc<dyn DocumentStore>,
}

impl MailFetcher {
    pub fn new(api: Arc<dyn MailApi>, store: Arc<dyn DocumentStore>) -> Self {
        Self { api, store }
    }

    async fn load_snapshot(&self) -> Vec<Message> {
        match load_typed::<Vec<Message>>(self.store.as_ref(), SNAPSHOT_KEY).await {
            Ok(Some(messages)) => messages,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to load mail snapshot, treating as empty");
                Vec::new()
            }
        }
    }

    async fn save_snapshot(&self, messages: &[Message]) {
        match save_typed(self.store.as_ref(), SNAPSHOT_KEY, messages).await {
            Ok(()) => info!(count = messages.len(), "Saved mail snapshot"),
            Err(e) => warn!(error = %e, "Failed to save mail snapshot"),
        }
    }
}

/// Start of a window of `hours` ending at `now`, never earlier than the
/// Unix epoch.
fn window_start(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    Duration::try_hours(i64::from(hours))
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(epoch, |start| start.max(epoch))
}

#[async_trait]
impl MailSource for MailFetcher {
    async fn fetch(&self, hours: u32, allow_cache: bool) -> Vec<Message> {
        if allow_cache {
            let cached = self.load_snapshot().await;
            if !cached.is_empty() {
                info!(count = cached.len(), "Loaded emails from snapshot cache");
                return cached;
            }
        }

        let since = window_start(Utc::now(), hours);
        match self.api.list_messages(since).await {
            Ok(messages) => {
                info!(
                    source = self.api.name(),
                    count = messages.len(),
                    hours,
                    "Fetched emails from remote source"
                );
                self.save_snapshot(&messages).await;
                messages
            }
            Err(e) => {
                error!(source = self.api.name(), error = %e, "Error fetching emails");
                let cached = self.load_snapshot().await;
                if !cached.is_empty() {
                    warn!(count = cached.len(), "Falling back to snapshot cache");
                }
                cached
            }
        }
    }
}
