use std::path::{Path, PathBuf};

use defungi_inference::model::default_candidates;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config/defungi.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: f32,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact paths tried in order; the first one that exists is loaded.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
    /// Load the artifact before accepting requests instead of on first use.
    #[serde(default)]
    pub preload: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default = "default_true")]
    pub include_features: bool,
    #[serde(default = "default_true")]
    pub include_probabilities: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: usize,
}

fn default_version() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_payload() -> usize {
    16 * 1024 * 1024
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { candidates: default_candidates(), preload: false }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { include_features: true, include_probabilities: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_payload_bytes: default_max_payload(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: ModelConfig::default(),
            response: ResponseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `DEFUNGI_CONFIG` (or `config/defungi.yaml`), then applies
    /// environment overrides. A missing file falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("DEFUNGI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(Path::new(&config_path))?
        } else {
            log::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    /// `DEFUNGI_MODEL_PATH` becomes the highest-priority candidate; `HOST`
    /// and `PORT` replace the bind address.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DEFUNGI_MODEL_PATH").filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            self.model.candidates.retain(|c| c != &path);
            self.model.candidates.insert(0, path);
        }
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: "PORT".to_string(), value: port.clone() })?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
