//! Gmail REST adapter: message listing and full-message retrieval.
//!
//! Only the read path is implemented. Obtaining and refreshing the OAuth
//! access token happens outside this crate; the token is passed in.

use std::future::Future;

use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::mail::{MailApi, Message};

const SOURCE: &str = "gmail";

/// Gmail encodes bodies as URL-safe base64, with or without padding.
const GMAIL_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Page size requested from `messages.list`.
const PAGE_SIZE: usize = 100;

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// A message as returned by `messages.get?format=full`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    /// Epoch milliseconds, as a decimal string.
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

/// One node of the MIME tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    pub data: Option<String>,
}

// ── Extraction ──────────────────────────────────────────────────────

impl MessagePart {
    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn mime_essence(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    fn decoded_body(&self) -> Option<String> {
        let data = self.body.data.as_deref()?;
        let bytes = GMAIL_BASE64.decode(data.trim()).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Plain-text body of a message.
///
/// Walks multipart trees depth-first and returns the first decodable
/// `text/plain` leaf. A non-multipart payload of any `text/*` type is used
/// as-is. Anything else yields an empty body.
pub fn extract_plain_text(payload: &MessagePart) -> String {
    first_text_plain(payload)
        .or_else(|| {
            (payload.parts.is_empty() && payload.mime_essence().starts_with("text/"))
                .then(|| payload.decoded_body())
                .flatten()
        })
        .unwrap_or_default()
}

fn first_text_plain(part: &MessagePart) -> Option<String> {
    if !part.parts.is_empty() {
        return part.parts.iter().find_map(first_text_plain);
    }
    if part.mime_essence() == "text/plain" {
        return part.decoded_body();
    }
    None
}

/// Resolve the send time: `Date` header, then `internalDate`, then `fallback`.
pub fn resolve_date(
    date_header: Option<&str>,
    internal_date: Option<&str>,
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    date_header
        .and_then(parse_rfc2822)
        .or_else(|| {
            internal_date
                .and_then(|ms| ms.trim().parse::<i64>().ok())
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        })
        .unwrap_or(fallback)
}

fn parse_rfc2822(raw: &str) -> Option<DateTime<Utc>> {
    let mut value = raw.trim();
    // Drop a trailing comment such as "(UTC)".
    if value.ends_with(')')
        && let Some(open) = value.rfind('(')
    {
        value = value[..open].trim_end();
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a full Gmail message into a pipeline `Message`.
pub fn to_message(raw: GmailMessage, fetched_at: DateTime<Utc>) -> Message {
    let payload = &raw.payload;
    Message {
        subject: payload.header("Subject").unwrap_or_default().to_string(),
        sender: payload.header("From").unwrap_or_default().to_string(),
        sent_at: resolve_date(
            payload.header("Date"),
            raw.internal_date.as_deref(),
            fetched_at,
        ),
        body: extract_plain_text(payload),
        id: raw.id,
        labels: raw.label_ids,
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Read-only Gmail client for the authenticated user's mailbox.
pub struct GmailApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    max_messages: usize,
}

impl GmailApi {
    /// Create a client. Without a token every listing fails with
    /// `SourceError::AuthFailed`, leaving the snapshot cache as the only
    /// source.
    pub fn new(base_url: &str, token: Option<SecretString>, max_messages: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            max_messages,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SourceError> {
        let token = self.token.as_ref().ok_or_else(|| SourceError::AuthFailed {
            source_name: SOURCE.to_string(),
        })?;

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::AuthFailed {
                source_name: SOURCE.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::RequestFailed {
                source_name: SOURCE.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SourceError::InvalidResponse {
            source_name: SOURCE.to_string(),
            reason: e.to_string(),
        })
    }

    /// IDs of messages received after `since`, following pagination.
    async fn list_ids(&self, since: DateTime<Utc>) -> Result<Vec<String>, SourceError> {
        let query = format!("after:{}", since.timestamp());
        collect_ids(self.max_messages, |page_size, page_token| {
            let mut params = vec![("q", query.clone()), ("maxResults", page_size.to_string())];
            if let Some(token) = page_token {
                params.push(("pageToken", token));
            }
            let request = self.client.get(self.messages_url()).query(&params);
            async move { self.get_json::<ListResponse>(request).await }
        })
        .await
    }
}

/// Walk `messages.list` pages until the listing is exhausted or
/// `max_messages` IDs are collected. `fetch_page` receives the page size to
/// request and the page token from the previous page.
async fn collect_ids<F, Fut>(
    max_messages: usize,
    mut fetch_page: F,
) -> Result<Vec<String>, SourceError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<ListResponse, SourceError>>,
{
    let mut ids = Vec::new();
    let mut page_token: Option<String> = None;

    while ids.len() < max_messages {
        let page_size = PAGE_SIZE.min(max_messages - ids.len());
        let page = fetch_page(page_size, page_token.take()).await?;
        ids.extend(page.messages.into_iter().map(|m| m.id));

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    ids.truncate(max_messages);
    Ok(ids)
}

#[async_trait]
impl MailApi for GmailApi {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn list_messages(&self, since: DateTime<Utc>) -> Result<Vec<Message>, SourceError> {
        let ids = self.list_ids(since).await?;
        info!("Fetching {} emails from Gmail", ids.len());

        let fetched_at = Utc::now();
        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            let url = format!("{}/{}", self.messages_url(), id);
            let raw: GmailMessage = self
                .get_json(self.client.get(url).query(&[("format", "full")]))
                .await?;
            debug!(id = %raw.id, "Fetched message");
            messages.push(to_message(raw, fetched_at));
        }
        Ok(messages)
    }
}
