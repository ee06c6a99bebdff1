//! Configuration management for the ladder
//!
//! This module handles configuration loading from TOML files and
//! environment variables, validation, and default values.

pub mod app;
pub mod storage;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use storage::{RemoteStoreSettings, StorageSettings};
