//! Remote versioned file store backend
//!
//! Documents live as files in a hosted git repository and are accessed
//! through its contents API. Every file carries a content revision (the
//! blob sha); updates must name the revision they replace, and files that
//! do not exist yet are created by omitting it.

use crate::config::RemoteStoreSettings;
use crate::error::{LadderError, Result};
use crate::storage::{StorageBackend, StorageKey, StoredDocument};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const BACKEND: &str = "remote";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: ContentsRef,
}

#[derive(Debug, Deserialize)]
struct ContentsRef {
    sha: String,
}

/// Reads and writes documents through a hosted repository's contents API
#[derive(Debug, Clone)]
pub struct RemoteFileBackend {
    settings: RemoteStoreSettings,
    client: Client,
}

impl RemoteFileBackend {
    /// Create a new remote backend
    pub fn new(settings: RemoteStoreSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("skill-ladder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LadderError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        info!(
            "Remote store: {}/{} on branch {}",
            settings.owner, settings.repository, settings.branch
        );

        Ok(Self { settings, client })
    }

    fn path_for(&self, key: StorageKey) -> &str {
        match key {
            StorageKey::Ratings => &self.settings.ratings_path,
            StorageKey::History => &self.settings.history_path,
        }
    }

    /// Contents API URL of the file backing `key`
    pub fn contents_url(&self, key: StorageKey) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.owner,
            self.settings.repository,
            self.path_for(key).trim_start_matches('/'),
        )
    }

    async fn fetch_contents(&self, key: StorageKey) -> Result<ContentsResponse> {
        let response = self
            .client
            .get(self.contents_url(key))
            .query(&[("ref", self.settings.branch.as_str())])
            .bearer_auth(&self.settings.token)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(key, status));
        }

        response.json().await.map_err(transport_error)
    }

    /// Files above the API's inline size limit come back without content,
    /// so their bytes are fetched in raw form instead
    async fn read_raw(&self, key: StorageKey) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.contents_url(key))
            .query(&[("ref", self.settings.branch.as_str())])
            .bearer_auth(&self.settings.token)
            .header(reqwest::header::ACCEPT, ACCEPT_RAW)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(key, status));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl StorageBackend for RemoteFileBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn read(&self, key: StorageKey) -> Result<StoredDocument> {
        let contents = self.fetch_contents(key).await?;
        let bytes = if contents.encoding == "base64" {
            decode_content(&contents.content)?
        } else {
            debug!("{} has no inline content, fetching raw", key);
            self.read_raw(key).await?
        };

        debug!("Read {} bytes of {} at revision {}", bytes.len(), key, contents.sha);
        Ok(StoredDocument {
            bytes,
            revision: Some(contents.sha),
        })
    }

    /// Current sha of the file, without decoding its content
    async fn revision(&self, key: StorageKey) -> Result<Option<String>> {
        match self.fetch_contents(key).await {
            Ok(contents) => Ok(Some(contents.sha)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(
        &self,
        key: StorageKey,
        bytes: &[u8],
        expected_revision: Option<&str>,
    ) -> Result<Option<String>> {
        let request = PutContentsRequest {
            message: format!("Update {} ({})", key, self.path_for(key)),
            content: STANDARD.encode(bytes),
            branch: &self.settings.branch,
            sha: expected_revision,
        };

        let response = self
            .client
            .put(self.contents_url(key))
            .bearer_auth(&self.settings.token)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(key, status));
        }

        let created: PutContentsResponse = response.json().await.map_err(transport_error)?;
        debug!(
            "{} {} at revision {}",
            if expected_revision.is_some() { "Updated" } else { "Created" },
            key,
            created.content.sha
        );
        Ok(Some(created.content.sha))
    }
}

/// Decode the API's base64 payload, which is wrapped at 60 columns
fn decode_content(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| LadderError::storage(BACKEND, format!("Invalid base64 content: {}", e)))
}

/// Map an unsuccessful HTTP status onto the error taxonomy
fn status_error(key: StorageKey, status: StatusCode) -> LadderError {
    match status {
        StatusCode::NOT_FOUND => LadderError::NotFound {
            key: key.to_string(),
        },
        // Stale sha on update, or missing sha for an existing file on create
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => LadderError::Conflict {
            key: key.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LadderError::storage(BACKEND, format!("Access to {} denied ({})", key, status))
        }
        _ => LadderError::storage(BACKEND, format!("Unexpected status {} for {}", status, key)),
    }
}

fn transport_error(error: reqwest::Error) -> LadderError {
    LadderError::storage(BACKEND, error.to_string())
}
