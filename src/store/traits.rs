//! Key-value document store used for both pipeline caches.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;

/// A persisted JSON document.
pub type Document = serde_json::Value;

/// Whole-document key-value store.
///
/// `save` has full-replace semantics: a successful save supersedes the prior
/// document entirely and a failed save leaves it untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the document stored under `key`, or `None` if there is none.
    async fn load(&self, key: &str) -> Result<Option<Document>, CacheError>;

    /// Replace the document stored under `key`.
    async fn save(&self, key: &str, document: &Document) -> Result<(), CacheError>;
}

/// Load `key` and decode it as `T`.
pub async fn load_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    let Some(document) = store.load(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(document)
        .map(Some)
        .map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Encode `value` and save it under `key`.
pub async fn save_typed<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    let document = serde_json::to_value(value).map_err(|source| CacheError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.save(key, &document).await
}
