use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::TriageError;

/// Application configuration.
///
/// Constructed once at startup and passed by reference into the pipeline;
/// there is no global config state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Ingestion and classification limits
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Limits and feature flags consumed by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum email body length in characters; longer bodies are truncated
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Maximum subject length in characters
    #[serde(default = "default_max_subject_length")]
    pub max_subject_length: usize,

    /// Number of unseen messages fetched when the caller gives no limit
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Hard ceiling on the batch size; caller-supplied limits are clamped
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Timeout for IMAP connection establishment and per-message fetches
    #[serde(default = "default_imap_timeout")]
    pub imap_timeout_seconds: u64,

    /// Master switch for the ingestion pipeline
    #[serde(default = "default_true")]
    pub processing_enabled: bool,

    /// Whether to generate suggested response templates
    #[serde(default = "default_true")]
    pub response_generation_enabled: bool,
}

fn default_max_content_length() -> usize {
    10_000
}

fn default_max_subject_length() -> usize {
    200
}

fn default_batch_size() -> usize {
    10
}

fn default_max_batch_size() -> usize {
    50
}

fn default_imap_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("inbox-triage").join("triage.db"))
        .unwrap_or_else(|| PathBuf::from("triage.db"))
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            max_subject_length: default_max_subject_length(),
            default_batch_size: default_batch_size(),
            max_batch_size: default_max_batch_size(),
            imap_timeout_seconds: default_imap_timeout(),
            processing_enabled: true,
            response_generation_enabled: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // XDG config path
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("inbox-triage").join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("inbox-triage")
                .join("config.toml"),
        );
    }

    paths
}

/// Load configuration from the first default path that exists,
/// falling back to built-in defaults when no file is found.
pub fn load() -> Result<AppConfig, TriageError> {
    for path in default_config_paths() {
        if path.exists() {
            return load_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load configuration from a specific path
pub fn load_from_path(path: &Path) -> Result<AppConfig, TriageError> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| TriageError::Config(format!("Failed to read config: {}", e)))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| TriageError::Config(format!("Failed to parse config: {}", e)))?;

    Ok(config)
}
