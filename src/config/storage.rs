//! Storage configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where ratings and history are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the local files
    pub data_dir: PathBuf,
    /// Local ratings snapshot file name
    pub ratings_file: String,
    /// Local history log file name
    pub history_file: String,
    /// Players seeded at the prior when nothing has been persisted yet
    pub bootstrap_players: Vec<String>,
    /// Remote versioned store; absent when no credentials are configured
    pub remote: Option<RemoteStoreSettings>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            ratings_file: "ratings.json".to_string(),
            history_file: "history.json".to_string(),
            bootstrap_players: ["Bav", "Sam", "Riz", "Emily"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            remote: None,
        }
    }
}

impl StorageSettings {
    /// Remote settings, only when credentials are actually present
    pub fn remote_credentials(&self) -> Option<&RemoteStoreSettings> {
        self.remote
            .as_ref()
            .filter(|remote| !remote.token.trim().is_empty())
    }
}

/// Remote versioned file store settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteStoreSettings {
    /// Base URL of the contents API
    pub api_url: String,
    pub owner: String,
    pub repository: String,
    pub branch: String,
    /// Access token; never logged
    pub token: String,
    /// Path of the ratings snapshot inside the repository
    pub ratings_path: String,
    /// Path of the history log inside the repository
    pub history_path: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for RemoteStoreSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: String::new(),
            repository: String::new(),
            branch: "main".to_string(),
            token: String::new(),
            ratings_path: "ratings.json".to_string(),
            history_path: "history.json".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for RemoteStoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStoreSettings")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("ratings_path", &self.ratings_path)
            .field("history_path", &self.history_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
