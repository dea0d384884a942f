use std::fmt;
use thiserror::Error;
use watchlist_sync_sources::SourceError;

/// The collections fetched at the start of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    PlexWatchlist,
    LetterboxdWatchlist,
    LetterboxdWatched,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::PlexWatchlist => write!(f, "Plex watchlist"),
            Collection::LetterboxdWatchlist => write!(f, "Letterboxd watchlist"),
            Collection::LetterboxdWatched => write!(f, "Letterboxd watched films"),
        }
    }
}

/// Errors that abort a sync run before any mutation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Plex authentication failed: {0}")]
    Authentication(#[source] SourceError),

    #[error("failed to fetch {collection}: {source}")]
    Fetch {
        collection: Collection,
        #[source]
        source: SourceError,
    },

    #[error("failed to set up clients: {0}")]
    Setup(#[source] SourceError),
}

impl SyncError {
    pub(crate) fn fetch(collection: Collection) -> impl FnOnce(SourceError) -> Self {
        move |source| SyncError::Fetch { collection, source }
    }
}
