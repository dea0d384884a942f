use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::ConfigError;

pub const DEFAULT_LETTERBOXD_URL: &str = "https://letterboxd-list-radarr.onrender.com";
pub const DEFAULT_DISCOVER_URL: &str = "https://discover.provider.plex.tv";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub letterboxd: LetterboxdConfig,
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LetterboxdConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_letterboxd_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlexConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default = "default_discover_url")]
    pub discover_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Strategy used when two films share no comparable external id
    #[serde(default)]
    pub fallback: FallbackStrategy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Normalized title and release year must both be equal
    #[default]
    TitleYear,
    /// Only external ids are trusted
    Disabled,
}

fn default_letterboxd_url() -> String {
    DEFAULT_LETTERBOXD_URL.to_string()
}

fn default_discover_url() -> String {
    DEFAULT_DISCOVER_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            base_url: default_letterboxd_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            discover_url: default_discover_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load the config file if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;
        Ok(())
    }
}
