//! Main application configuration
//!
//! This module defines the top-level configuration for the ladder,
//! including TOML file loading, environment variable overrides and
//! validation.

use crate::config::storage::{RemoteStoreSettings, StorageSettings};
use crate::rating::TrueSkillSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: TrueSkillSettings,
    pub storage: StorageSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "skill-ladder".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(mu) = env::var("RATING_INITIAL_MU") {
            self.rating.initial_mu = parse_var("RATING_INITIAL_MU", &mu)?;
        }
        if let Ok(sigma) = env::var("RATING_INITIAL_SIGMA") {
            self.rating.initial_sigma = parse_var("RATING_INITIAL_SIGMA", &sigma)?;
        }
        if let Ok(beta) = env::var("RATING_BETA") {
            self.rating.beta = Some(parse_var("RATING_BETA", &beta)?);
        }
        if let Ok(tau) = env::var("RATING_TAU") {
            self.rating.tau = Some(parse_var("RATING_TAU", &tau)?);
        }

        // Storage settings
        if let Ok(dir) = env::var("LADDER_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(players) = env::var("LADDER_BOOTSTRAP_PLAYERS") {
            self.storage.bootstrap_players = players
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }

        // Remote store settings; a token switches the remote backend on
        if let Ok(token) = env::var("REMOTE_STORE_TOKEN") {
            self.storage
                .remote
                .get_or_insert_with(RemoteStoreSettings::default)
                .token = token;
        }
        if let Some(remote) = self.storage.remote.as_mut() {
            if let Ok(owner) = env::var("REMOTE_STORE_OWNER") {
                remote.owner = owner;
            }
            if let Ok(repository) = env::var("REMOTE_STORE_REPOSITORY") {
                remote.repository = repository;
            }
            if let Ok(branch) = env::var("REMOTE_STORE_BRANCH") {
                remote.branch = branch;
            }
            if let Ok(api_url) = env::var("REMOTE_STORE_API_URL") {
                remote.api_url = api_url;
            }
            if let Ok(timeout) = env::var("REMOTE_STORE_TIMEOUT_SECONDS") {
                remote.timeout_seconds = parse_var("REMOTE_STORE_TIMEOUT_SECONDS", &timeout)?;
            }
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate rating model
    config.rating.validate()?;

    // Validate storage settings
    if config.storage.ratings_file.is_empty() || config.storage.history_file.is_empty() {
        return Err(anyhow!("Storage file names cannot be empty"));
    }
    if config.storage.ratings_file == config.storage.history_file {
        return Err(anyhow!("Ratings and history must be stored in different files"));
    }

    let mut seen = HashSet::new();
    for name in &config.storage.bootstrap_players {
        if name.trim().is_empty() {
            return Err(anyhow!("Bootstrap player names cannot be empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(anyhow!("Duplicate bootstrap player: {}", name));
        }
    }

    // Validate remote settings only when credentials make them active
    if let Some(remote) = config.storage.remote_credentials() {
        if remote.owner.is_empty() || remote.repository.is_empty() {
            return Err(anyhow!("Remote store owner and repository are required"));
        }
        if remote.api_url.is_empty() {
            return Err(anyhow!("Remote store API URL cannot be empty"));
        }
        if remote.ratings_path == remote.history_path {
            return Err(anyhow!("Remote ratings and history paths must differ"));
        }
        if remote.timeout_seconds == 0 {
            return Err(anyhow!("Remote store timeout must be greater than 0"));
        }
    }

    Ok(())
}
