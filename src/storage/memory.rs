//! In-memory storage backend
//!
//! A versioned instance behaves like the remote store (every document
//! carries a revision and writes must name the revision they replace); an
//! unversioned one behaves like the local files. Neither does any I/O,
//! which makes them suitable for tests and short-lived sessions.

use crate::error::{LadderError, Result};
use crate::storage::{StorageBackend, StorageKey, StoredDocument};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

const BACKEND: &str = "memory";

#[derive(Debug, Clone)]
struct Slot {
    bytes: Vec<u8>,
    version: u64,
}

/// Revisioned document store held in memory
#[derive(Debug)]
pub struct InMemoryBackend {
    documents: RwLock<HashMap<StorageKey, Slot>>,
    write_log: RwLock<Vec<StorageKey>>,
    versioned: bool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Backend with optimistic concurrency on every document
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            write_log: RwLock::new(Vec::new()),
            versioned: true,
        }
    }

    /// Backend that overwrites unconditionally and reports no revisions
    pub fn unversioned() -> Self {
        Self {
            versioned: false,
            ..Self::new()
        }
    }

    /// Preset a document, bumping its revision
    pub fn insert(&self, key: StorageKey, bytes: impl Into<Vec<u8>>) -> Result<String> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| LadderError::storage(BACKEND, "Failed to acquire documents write lock"))?;

        let version = documents.get(&key).map_or(1, |slot| slot.version + 1);
        documents.insert(
            key,
            Slot {
                bytes: bytes.into(),
                version,
            },
        );
        Ok(revision(version))
    }

    /// Current contents of a document, if any
    pub fn get(&self, key: StorageKey) -> Option<Vec<u8>> {
        self.documents
            .read()
            .ok()
            .and_then(|documents| documents.get(&key).map(|slot| slot.bytes.clone()))
    }

    /// Keys of every successful write, in order
    pub fn writes(&self) -> Vec<StorageKey> {
        self.write_log
            .read()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

fn revision(version: u64) -> String {
    format!("r{}", version)
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn read(&self, key: StorageKey) -> Result<StoredDocument> {
        let documents = self
            .documents
            .read()
            .map_err(|_| LadderError::storage(BACKEND, "Failed to acquire documents read lock"))?;

        documents
            .get(&key)
            .map(|slot| StoredDocument {
                bytes: slot.bytes.clone(),
                revision: self.versioned.then(|| revision(slot.version)),
            })
            .ok_or_else(|| LadderError::NotFound {
                key: key.to_string(),
            })
    }

    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| LadderError::storage(BACKEND, "Failed to acquire documents write lock"))?;

        let current = documents.get(&key).map(|slot| revision(slot.version));
        if self.versioned && current.as_deref() != expected_revision {
            return Err(LadderError::Conflict {
                key: key.to_string(),
            });
        }

        let version = documents.get(&key).map_or(1, |slot| slot.version + 1);
        documents.insert(
            key,
            Slot {
                bytes: bytes.to_vec(),
                version,
            },
        );
        drop(documents);

        if let Ok(mut log) = self.write_log.write() {
            log.push(key);
        }

        Ok(self.versioned.then(|| revision(version)))
    }
}
