//! Configuration loading for Historias.
//! Reads historias.toml from the current directory or the path in the HISTORIAS_CONFIG env var.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{DashboardError, Result};

const DEFAULT_CONFIG_PATH: &str = "historias.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind()      -> String { "127.0.0.1:3001".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level() }
    }
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Applies to each backend request and to the combined initial load.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_feedback_key", deserialize_with = "secret")]
    pub feedback_api_key: SecretString,
}

fn default_base_url()     -> String       { "http://localhost:8000".to_string() }
fn default_timeout_secs() -> u64          { 5 }
fn default_feedback_key() -> SecretString { SecretString::from("changeme".to_string()) }

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            feedback_api_key: default_feedback_key(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load configuration, then apply environment overrides.
    /// An explicit HISTORIAS_CONFIG path must exist; the default path may be absent.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("HISTORIAS_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            return Err(DashboardError::Config(format!(
                "Config file not found: {}\n\
                 Copy historias.example.toml to historias.toml and edit it.",
                path
            )));
        } else {
            info!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DashboardError::Config(e.to_string()))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("HISTORIAS_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(key) = lookup("HISTORIAS_FEEDBACK_API_KEY") {
            self.backend.feedback_api_key = SecretString::from(key);
        }
        if let Some(bind) = lookup("HISTORIAS_BIND") {
            self.server.bind = bind;
        }
    }
}
