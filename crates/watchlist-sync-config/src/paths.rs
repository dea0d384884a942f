use std::path::{Path, PathBuf};
use crate::error::ConfigError;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "LETTERPLEX_CONFIG_DIR";

pub struct PathManager {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join("letterplex"),
        };
        Ok(Self::with_base_dir(base_dir))
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            log_dir: base_dir.join("logs"),
            config_dir: base_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join("letterplex.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_base_dir() {
        let paths = PathManager::with_base_dir(PathBuf::from("/srv/letterplex"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/letterplex/config.toml"));
        assert_eq!(paths.credentials_file(), PathBuf::from("/srv/letterplex/credentials.toml"));
        assert_eq!(paths.default_log_file(), PathBuf::from("/srv/letterplex/logs/letterplex.log"));
    }
}
