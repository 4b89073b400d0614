//! In-process document store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::CacheError;
use crate::store::traits::{Document, DocumentStore};

/// `HashMap`-backed store. Counts saves and can be told to fail them, which
/// makes cache policy observable without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without counting it as a save.
    pub fn with_document(self, key: &str, document: Document) -> Self {
        self.lock().insert(key.to_string(), document);
        self
    }

    /// Current document under `key`.
    pub fn get(&self, key: &str) -> Option<Document> {
        self.lock().get(key).cloned()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail with an IO error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Document>> {
        // A poisoned map still holds whole documents; keep using it.
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Document>, CacheError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, document: &Document) -> Result<(), CacheError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CacheError::Io {
                key: key.to_string(),
                source: std::io::Error::other("save disabled"),
            });
        }
        self.lock().insert(key.to_string(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_and_load() {
        let store = MemoryStore::new();
        store.save("k", &json!([1])).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(json!([1])));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn seeded_documents_are_not_counted() {
        let store = MemoryStore::new().with_document("k", json!(["seed"]));
        assert_eq!(store.load("k").await.unwrap(), Some(json!(["seed"])));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn failing_saves_keep_prior_document() {
        let store = MemoryStore::new().with_document("k", json!(["old"]));
        store.set_fail_saves(true);
        assert!(store.save("k", &json!(["new"])).await.is_err());
        assert_eq!(store.get("k"), Some(json!(["old"])));
        assert_eq!(store.save_count(), 0);
    }
}
