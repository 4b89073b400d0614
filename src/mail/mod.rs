//! Mail source boundary.
//!
//! - `MailApi`: remote I/O only (Gmail REST, test fakes). May fail.
//! - `MailSource`: what the pipeline sees. Never fails; `MailFetcher`
//!   implements it by layering the snapshot cache over a `MailApi`.

pub mod fetcher;
pub mod gmail;

pub use fetcher::MailFetcher;
pub use gmail::GmailApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Number of body characters sent to the model in any single prompt.
pub const BODY_PREFIX_CHARS: usize = 2000;

/// One fetched email. Immutable once created.
///
/// Field order and names match the cache file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    pub sender: String,
    #[serde(rename = "date")]
    pub sent_at: DateTime<Utc>,
    pub body: String,
    /// Source-assigned unique ID.
    #[serde(rename = "message_id")]
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Message {
    /// The first `BODY_PREFIX_CHARS` characters of the body.
    pub fn body_prefix(&self) -> &str {
        match self.body.char_indices().nth(BODY_PREFIX_CHARS) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }
}

/// Remote mail API: list every message received since `since`.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// Source name, for logging.
    fn name(&self) -> &str;

    async fn list_messages(&self, since: DateTime<Utc>) -> Result<Vec<Message>, SourceError>;
}

/// The pipeline's view of a mail source.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Messages from the last `hours` hours, oldest-to-newest as the source
    /// reports them. With `allow_cache`, a non-empty snapshot is returned
    /// as-is. Never fails: the floor is an empty list.
    async fn fetch(&self, hours: u32, allow_cache: bool) -> Vec<Message>;
}
