//! Durable storage for the ladder
//!
//! Two logical documents are stored: the current ratings snapshot and the
//! full History Log. Each backend implements the same read/write contract;
//! [`FallbackStore`] composes a remote backend with a local one and tracks
//! remote revisions, and [`Persistence`] handles serialization on top.

pub mod fallback;
pub mod local;
pub mod memory;
pub mod persistence;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

// Re-export commonly used types
pub use fallback::{FallbackStore, RemoteRevision, WriteReceipt};
pub use local::LocalFileBackend;
pub use memory::InMemoryBackend;
pub use persistence::Persistence;
pub use remote::RemoteFileBackend;

/// The two documents a backend stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Ratings,
    History,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Ratings => "ratings",
            StorageKey::History => "history",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw document contents plus the backend's revision token, if it has one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub bytes: Vec<u8>,
    pub revision: Option<String>,
}

/// Trait for document storage backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs and errors
    fn name(&self) -> &'static str;

    /// Read a document; a missing document is `LadderError::NotFound`
    async fn read(&self, key: StorageKey) -> Result<StoredDocument>;

    /// Replace a document
    ///
    /// `expected_revision` is the revision being replaced; `None` means the
    /// document is believed not to exist yet. Backends without revisions
    /// ignore it. Returns the new revision, if the backend tracks one.
    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        expected_revision: Option<&str>,
    ) -> Result<Option<String>>;

    /// Current revision of a document, `None` when it does not exist
    ///
    /// The default reads the whole document; backends with a cheaper
    /// metadata lookup override it.
    async fn revision(&self, key: StorageKey) -> Result<Option<String>> {
        match self.read(key).await {
            Ok(document) => Ok(document.revision),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn read(&self, key: StorageKey) -> Result<StoredDocument> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        (**self).write(key, bytes, expected_revision).await
    }

    async fn revision(&self, key: StorageKey) -> Result<Option<String>> {
        (**self).revision(key).await
    }
}
