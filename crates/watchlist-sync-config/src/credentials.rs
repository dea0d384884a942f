use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::ConfigError;

/// On-disk shape of credentials.toml
#[derive(Debug, Default, Serialize, Deserialize)]
struct Secrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plex_token: Option<String>,
}

/// Secrets kept out of config.toml, written with owner-only permissions
pub struct CredentialStore {
    path: PathBuf,
    secrets: Secrets,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            secrets: Secrets::default(),
        }
    }

    /// Load secrets from disk; a missing file leaves the store empty
    pub fn load(&mut self) -> Result<(), ConfigError> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
        self.secrets = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(&self.secrets)?;
        std::fs::write(&self.path, content).map_err(|e| ConfigError::io(&self.path, e))?;
        restrict_permissions(&self.path);
        Ok(())
    }

    pub fn get_plex_token(&self) -> Option<&String> {
        self.secrets.plex_token.as_ref().filter(|t| !t.trim().is_empty())
    }

    pub fn set_plex_token(&mut self, token: String) {
        self.secrets.plex_token = Some(token);
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plex_token_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("abc123".to_string());
        store.save().unwrap();

        let mut loaded = CredentialStore::new(path);
        loaded.load().unwrap();
        assert_eq!(loaded.get_plex_token().map(String::as_str), Some("abc123"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::new(dir.path().join("credentials.toml"));
        store.load().unwrap();
        assert_eq!(store.get_plex_token(), None);
    }

    #[test]
    fn test_blank_token_counts_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "plex_token = \"  \"\n").unwrap();

        let mut store = CredentialStore::new(path);
        store.load().unwrap();
        assert_eq!(store.get_plex_token(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("abc123".to_string());
        store.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
