//! Test fixtures and storage doubles for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use skill_ladder::error::{LadderError, Result};
use skill_ladder::storage::{
    FallbackStore, InMemoryBackend, LocalFileBackend, Persistence, StorageBackend, StorageKey,
    StoredDocument,
};
use skill_ladder::{LadderService, PlayerName, TrueSkillCalculator};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Remote store double that can be taken offline mid-test
///
/// Wraps a versioned [`InMemoryBackend`], so it enforces revisions the way
/// the real remote store does, and records every attempted call.
#[derive(Debug)]
pub struct SwitchableRemote {
    inner: InMemoryBackend,
    online: AtomicBool,
    attempts: Arc<Mutex<Vec<(&'static str, StorageKey)>>>,
}

impl SwitchableRemote {
    pub fn new() -> Self {
        Self {
            inner: InMemoryBackend::new(),
            online: AtomicBool::new(true),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Direct access to the stored documents
    pub fn documents(&self) -> &InMemoryBackend {
        &self.inner
    }

    /// Every read and write attempted, successful or not
    pub fn attempts(&self) -> Vec<(&'static str, StorageKey)> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }

    fn record(&self, operation: &'static str, key: StorageKey) -> Result<()> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push((operation, key));
        }
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LadderError::Storage {
                backend: "remote",
                message: "network unreachable".to_string(),
            })
        }
    }
}

#[async_trait]
impl StorageBackend for SwitchableRemote {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn read(&self, key: StorageKey) -> Result<StoredDocument> {
        self.record("read", key)?;
        self.inner.read(key).await
    }

    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        self.record("write", key)?;
        self.inner.write(key, bytes, expected_revision).await
    }
}

/// Scratch data directory removed on drop
pub struct TempDataDir {
    path: PathBuf,
}

impl TempDataDir {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("skill-ladder-it-{}", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_json(&self, file: &str) -> serde_json::Value {
        let contents = std::fs::read_to_string(self.path.join(file)).unwrap();
        serde_json::from_str(&contents).unwrap()
    }
}

impl Drop for TempDataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub fn names(players: &[&str]) -> Vec<PlayerName> {
    players.iter().map(|name| name.to_string()).collect()
}

/// Open a ladder with the default TrueSkill model over the given backends
pub async fn open_ladder(
    remote: Option<Arc<SwitchableRemote>>,
    data_dir: &Path,
    bootstrap: &[&str],
) -> LadderService {
    let remote = remote.map(|remote| Box::new(remote) as Box<dyn StorageBackend>);
    let store = FallbackStore::new(remote, Box::new(LocalFileBackend::new(data_dir)));

    LadderService::open(
        Box::new(TrueSkillCalculator::default()),
        Persistence::new(store),
        &names(bootstrap),
    )
    .await
}

/// Compare ratings loosely, JSON decoding may differ in the last bit
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
