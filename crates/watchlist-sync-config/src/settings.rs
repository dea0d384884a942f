use std::fmt;
use std::time::Duration;
use crate::config::{Config, FallbackStrategy};
use crate::credentials::CredentialStore;
use crate::error::ConfigError;

pub const PLEX_TOKEN_ENV: &str = "PLEX_TOKEN";
pub const PLEX_URL_ENV: &str = "PLEX_URL";
pub const LETTERBOXD_USERNAME_ENV: &str = "LETTERBOXD_USERNAME";

/// Everything a sync run needs, resolved once at startup
///
/// Environment variables take precedence over `config.toml` and
/// `credentials.toml`. Built by [`SyncSettings::resolve`] and handed to the
/// run driver by value.
#[derive(Clone)]
pub struct SyncSettings {
    pub letterboxd_username: String,
    pub letterboxd_base_url: String,
    pub letterboxd_timeout: Duration,
    pub plex_token: String,
    pub plex_server_url: String,
    pub plex_discover_url: String,
    pub plex_timeout: Duration,
    pub fallback: FallbackStrategy,
}

impl SyncSettings {
    /// Resolve settings from the process environment
    pub fn from_env(config: &Config, credentials: &CredentialStore) -> Result<Self, ConfigError> {
        Self::resolve(config, credentials, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup
    pub fn resolve<F>(config: &Config, credentials: &CredentialStore, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str, fallback: Option<&String>| -> Option<String> {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fallback.filter(|v| !v.trim().is_empty()).cloned())
                .map(|v| v.trim().to_string())
        };

        let plex_token = lookup(PLEX_TOKEN_ENV, credentials.get_plex_token());
        let plex_server_url = lookup(PLEX_URL_ENV, Some(&config.plex.server_url));
        let letterboxd_username = lookup(LETTERBOXD_USERNAME_ENV, Some(&config.letterboxd.username));

        let missing: Vec<String> = [
            (PLEX_TOKEN_ENV, plex_token.is_none()),
            (PLEX_URL_ENV, plex_server_url.is_none()),
            (LETTERBOXD_USERNAME_ENV, letterboxd_username.is_none()),
        ]
        .into_iter()
        .filter(|(_, is_missing)| *is_missing)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(plex_token), Some(plex_server_url), Some(letterboxd_username)) =
            (plex_token, plex_server_url, letterboxd_username)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let settings = Self {
            letterboxd_username,
            letterboxd_base_url: config.letterboxd.base_url.trim_end_matches('/').to_string(),
            letterboxd_timeout: Duration::from_secs(config.letterboxd.request_timeout_secs),
            plex_token,
            plex_server_url: plex_server_url.trim_end_matches('/').to_string(),
            plex_discover_url: config.plex.discover_url.trim_end_matches('/').to_string(),
            plex_timeout: Duration::from_secs(config.plex.request_timeout_secs),
            fallback: config.matching.fallback,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.letterboxd_username.contains('/') || self.letterboxd_username.contains(char::is_whitespace) {
            return Err(ConfigError::invalid(
                LETTERBOXD_USERNAME_ENV,
                "must be a bare Letterboxd username",
            ));
        }
        for (key, url) in [
            (PLEX_URL_ENV, &self.plex_server_url),
            ("plex.discover_url", &self.plex_discover_url),
            ("letterboxd.base_url", &self.letterboxd_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(key, format!("'{}' is not an http(s) URL", url)));
            }
        }
        if self.letterboxd_timeout.is_zero() {
            return Err(ConfigError::invalid("letterboxd.request_timeout_secs", "must be greater than zero"));
        }
        if self.plex_timeout.is_zero() {
            return Err(ConfigError::invalid("plex.request_timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSettings")
            .field("letterboxd_username", &self.letterboxd_username)
            .field("letterboxd_base_url", &self.letterboxd_base_url)
            .field("letterboxd_timeout", &self.letterboxd_timeout)
            .field("plex_token", &mask(&self.plex_token))
            .field("plex_server_url", &self.plex_server_url)
            .field("plex_discover_url", &self.plex_discover_url)
            .field("plex_timeout", &self.plex_timeout)
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Mask a secret, keeping the last four characters
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
