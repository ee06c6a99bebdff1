//! Local file backend
//!
//! Each document is a single JSON file in a data directory. Writes go to a
//! temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written file behind.

use crate::error::{LadderError, Result};
use crate::storage::{StorageBackend, StorageKey, StoredDocument};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const BACKEND: &str = "local";

/// Stores documents as files under a directory
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    data_dir: PathBuf,
    ratings_file: String,
    history_file: String,
}

impl LocalFileBackend {
    /// Create a backend with the default file names
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_file_names(data_dir, "ratings.json", "history.json")
    }

    pub fn with_file_names(
        data_dir: impl Into<PathBuf>,
        ratings_file: impl Into<String>,
        history_file: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            ratings_file: ratings_file.into(),
            history_file: history_file.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File path backing `key`
    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        match key {
            StorageKey::Ratings => self.data_dir.join(&self.ratings_file),
            StorageKey::History => self.data_dir.join(&self.history_file),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalFileBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn read(&self, key: StorageKey) -> Result<StoredDocument> {
        let path = self.path_for(key);

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(StoredDocument {
                    bytes,
                    revision: None,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LadderError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(LadderError::storage(
                BACKEND,
                format!("Failed to read {}: {}", path.display(), e),
            )),
        }
    }

    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        _expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        let path = self.path_for(key);

        fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            LadderError::storage(
                BACKEND,
                format!("Failed to create {}: {}", self.data_dir.display(), e),
            )
        })?;

        let temp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        fs::write(&temp_path, bytes).await.map_err(|e| {
            LadderError::storage(
                BACKEND,
                format!("Failed to write {}: {}", temp_path.display(), e),
            )
        })?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            // Best effort: the temp file is useless once the rename failed
            let _ = fs::remove_file(&temp_path).await;
            return Err(LadderError::storage(
                BACKEND,
                format!("Failed to replace {}: {}", path.display(), e),
            ));
        }

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(None)
    }
}
