//! Remote-first storage with local fallback
//!
//! Reads try the remote backend first and fall back to the local one on
//! any failure (no credentials, transport error, missing document, bad
//! contents). Writes do the same, so an update is never silently lost
//! when the remote store is unavailable. A successful remote write does
//! not refresh the local copy; after that the remote copy is the
//! authoritative one.
//!
//! The store remembers what it last saw of each remote document. A write
//! updates the known revision, creates the document only when the remote
//! reported it missing, and asks the remote for the current revision when
//! it has seen neither.

use crate::error::Result;
use crate::storage::{StorageBackend, StorageKey};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Which backend accepted a write, and the revision it assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub backend: &'static str,
    pub revision: Option<String>,
}

/// What the store knows about a remote document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRevision {
    /// The document exists at this revision
    Known(String),
    /// The remote reported the document missing
    Absent,
    /// Not observed yet, or the remote tracks no revisions
    Unknown,
}

/// Fallback decorator over an optional remote backend and a local one
pub struct FallbackStore {
    remote: Option<Box<dyn StorageBackend>>,
    local: Box<dyn StorageBackend>,
    revisions: Mutex<HashMap<StorageKey, RemoteRevision>>,
}

impl FallbackStore {
    pub fn new(remote: Option<Box<dyn StorageBackend>>, local: Box<dyn StorageBackend>) -> Self {
        if remote.is_none() {
            debug!("No remote store configured, using {} only", local.name());
        }
        Self {
            remote,
            local,
            revisions: Mutex::new(HashMap::new()),
        }
    }

    /// Store without a remote backend
    pub fn local_only(local: Box<dyn StorageBackend>) -> Self {
        Self::new(None, local)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Last observed state of the remote copy of `key`
    pub fn remote_revision(&self, key: StorageKey) -> RemoteRevision {
        self.revisions
            .lock()
            .ok()
            .and_then(|revisions| revisions.get(&key).cloned())
            .unwrap_or(RemoteRevision::Unknown)
    }

    fn remember(&self, key: StorageKey, revision: Option<String>) {
        let state = revision.map_or(RemoteRevision::Unknown, RemoteRevision::Known);
        self.set_remote_revision(key, state);
    }

    fn set_remote_revision(&self, key: StorageKey, state: RemoteRevision) {
        if let Ok(mut revisions) = self.revisions.lock() {
            revisions.insert(key, state);
        }
    }

    /// Read and decode a document, falling back when either step fails
    ///
    /// A remote copy that does not decode still records its revision, so
    /// the next write replaces it instead of trying to create it.
    pub async fn read_decoded<T, F>(&self, key: StorageKey, decode: F) -> Result<T>
    where
        F: Fn(&[u8]) -> Result<T> + Send + Sync,
        T: Send,
    {
        if let Some(remote) = &self.remote {
            let failure = match remote.read(key).await {
                Ok(document) => {
                    self.remember(key, document.revision);
                    match decode(&document.bytes) {
                        Ok(value) => return Ok(value),
                        Err(e) => e,
                    }
                }
                Err(e) => {
                    if e.is_not_found() {
                        self.set_remote_revision(key, RemoteRevision::Absent);
                    }
                    e
                }
            };

            warn!(
                "Reading {} from {} failed, falling back to {}: {}",
                key,
                remote.name(),
                self.local.name(),
                failure
            );
        }

        let document = self.local.read(key).await?;
        decode(&document.bytes)
    }

    /// Write a document to the remote backend, or locally if that fails
    pub async fn write_document(&self, key: StorageKey, bytes: &[u8]) -> Result<WriteReceipt> {
        if let Some(remote) = &self.remote {
            match self.write_remote(remote.as_ref(), key, bytes).await {
                Ok(revision) => {
                    return Ok(WriteReceipt {
                        backend: remote.name(),
                        revision,
                    })
                }
                Err(e) => warn!(
                    "Writing {} to {} failed, falling back to {}: {}",
                    key,
                    remote.name(),
                    self.local.name(),
                    e
                ),
            }
        }

        // Revisions belong to the remote copy
        let revision = self.local.write(key, bytes, None).await?;
        Ok(WriteReceipt {
            backend: self.local.name(),
            revision,
        })
    }

    async fn write_remote(
        &self,
        remote: &dyn StorageBackend,
        key: StorageKey,
        bytes: &[u8],
    ) -> Result<Option<String>> {
        let expected = match self.remote_revision(key) {
            RemoteRevision::Known(revision) => Some(revision),
            RemoteRevision::Absent => None,
            RemoteRevision::Unknown => {
                let current = remote.revision(key).await?;
                debug!(
                    "Looked up {} on {}: {}",
                    key,
                    remote.name(),
                    current.as_deref().unwrap_or("missing")
                );
                current
            }
        };

        let revision = remote.write(key, bytes, expected.as_deref()).await?;
        self.remember(key, revision.clone());
        Ok(revision)
    }
}
