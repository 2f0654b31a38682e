//! Configuration loading, validation, and management for docchat.
//!
//! Loads configuration from `~/.docchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// OCR engine configuration
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Answering flow configuration
    #[serde(default)]
    pub answer: AnswerConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .field("ocr", &self.ocr)
            .field("answer", &self.answer)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_port() -> u16 {
    8090
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_upload_mb() -> usize {
    25
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite" or "memory".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path. Defaults to `~/.docchat/documents.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// Resolve the SQLite path, falling back to the default location.
    pub fn sqlite_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| {
                AppConfig::config_dir()
                    .join("documents.db")
                    .to_string_lossy()
                    .into_owned()
            })
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Base URL of the OCR API.
    #[serde(default = "default_ocr_api_url")]
    pub api_url: String,

    /// API key. Usually supplied via `DOCCHAT_API_KEY` / `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_ocr_model")]
    pub model: String,

    /// Bounded timeout around the OCR call. OCR can take tens of seconds.
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ocr_api_url() -> String {
    "https://api.openai.com".into()
}
fn default_ocr_model() -> String {
    "gpt-4o-mini".into()
}
fn default_ocr_timeout_secs() -> u64 {
    120
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_url: default_ocr_api_url(),
            api_key: None,
            model: default_ocr_model(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Full URL of the hosted answering flow. Injected configuration, not a
    /// process-wide constant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_answer_timeout_secs() -> u64 {
    60
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            flow_url: None,
            api_key: None,
            timeout_secs: default_answer_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for AnswerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerConfig")
            .field("flow_url", &self.flow_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docchat/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `DOCCHAT_API_KEY` — OCR key (`OPENAI_API_KEY` is accepted as a
    ///   fallback only when neither the env var nor the file sets one)
    /// - `DOCCHAT_FLOW_URL` / `DOCCHAT_FLOW_API_KEY` — answering flow
    /// - `DOCCHAT_DB_PATH` — SQLite database path
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides. The `DOCCHAT_*` variables win
    /// over file values unconditionally; `OPENAI_API_KEY` only fills a gap.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DOCCHAT_API_KEY") {
            self.ocr.api_key = Some(key);
        } else if self.ocr.api_key.is_none() {
            self.ocr.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        if let Ok(url) = std::env::var("DOCCHAT_FLOW_URL") {
            self.answer.flow_url = Some(url);
        }
        if let Ok(key) = std::env::var("DOCCHAT_FLOW_API_KEY") {
            self.answer.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("DOCCHAT_DB_PATH") {
            self.store.path = Some(path);
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docchat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_upload_mb must be > 0".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown store backend '{other}' (expected 'sqlite' or 'memory')"
                )));
            }
        }

        if self.ocr.timeout_secs == 0 || self.answer.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
            ocr: OcrConfig::default(),
            answer: AnswerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
