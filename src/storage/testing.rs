//! Storage doubles shared by unit tests

use crate::error::{LadderError, Result};
use crate::storage::{StorageBackend, StorageKey, StoredDocument};
use async_trait::async_trait;

/// Backend whose every call fails
pub(crate) struct OfflineBackend;

#[async_trait]
impl StorageBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn read(&self, _key: StorageKey) -> Result<StoredDocument> {
        Err(LadderError::storage("offline", "connection refused"))
    }

    async fn write(
        &self,
        _key: StorageKey,
        _bytes: &[u8],
        _expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        Err(LadderError::storage("offline", "connection refused"))
    }
}
