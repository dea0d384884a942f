pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;
pub mod settings;

pub use config::{Config, FallbackStrategy, LetterboxdConfig, MatchingConfig, PlexConfig, DEFAULT_DISCOVER_URL, DEFAULT_LETTERBOXD_URL};
pub use credentials::CredentialStore;
pub use error::ConfigError;
pub use paths::{PathManager, CONFIG_DIR_ENV};
pub use settings::{mask, SyncSettings, LETTERBOXD_USERNAME_ENV, PLEX_TOKEN_ENV, PLEX_URL_ENV};
