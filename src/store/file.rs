//! File-backed document store: one pretty-printed JSON file per key.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::CacheError;
use crate::store::traits::{Document, DocumentStore};

/// Stores each key as `<base_dir>/<key>.json`.
///
/// Saves go through a temp file in the same directory followed by a rename,
/// so a reader sees either the old document or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<Document>, CacheError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key)(e)),
        };

        let document = serde_json::from_str(&raw).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded cache document");
        Ok(Some(document))
    }

    async fn save(&self, key: &str, document: &Document) -> Result<(), CacheError> {
        let body = serde_json::to_string_pretty(document).map_err(|source| {
            CacheError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;

        fs::create_dir_all(&self.base_dir).await.map_err(io_error(key))?;

        let target = self.path_for(key);
        let temp = self
            .base_dir
            .join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&temp, body).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(key)(e));
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(key)(e));
        }

        debug!(path = %target.display(), "Saved cache document");
        Ok(())
    }
}
