use async_trait::async_trait;
use watchlist_sync_models::{ExternalIds, FilmRecord, WatchlistEntry};
use crate::error::SourceError;

/// Read access to a Letterboxd user's lists
#[async_trait]
pub trait LetterboxdSource: Send + Sync {
    async fn get_watchlist(&self, username: &str) -> Result<Vec<FilmRecord>, SourceError>;
    async fn get_watched(&self, username: &str) -> Result<Vec<FilmRecord>, SourceError>;
}

/// The Plex account watchlist plus the Discover lookups needed to edit it
#[async_trait]
pub trait PlexWatchlist: Send + Sync {
    // Verify credentials before anything else touches the account
    async fn authenticate(&self) -> Result<(), SourceError>;

    async fn get_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError>;

    /// Resolve external ids for a single entry that arrived without GUIDs
    async fn lookup_ids(&self, entry: &WatchlistEntry) -> Result<ExternalIds, SourceError>;

    /// Discover candidates for a film, each carrying whatever ids Plex knows
    async fn discover(&self, film: &FilmRecord) -> Result<Vec<WatchlistEntry>, SourceError>;

    async fn add_to_watchlist(&self, rating_key: &str) -> Result<(), SourceError>;
    async fn remove_from_watchlist(&self, rating_key: &str) -> Result<(), SourceError>;
}
