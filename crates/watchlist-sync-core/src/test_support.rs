// In-memory collaborators for reconciler and orchestrator tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use watchlist_sync_models::{ExternalIds, FilmRecord, PlexMediaType, WatchlistEntry};
use watchlist_sync_sources::{LetterboxdSource, PlexWatchlist, SourceError};

fn imdb_ids(imdb: Option<&str>) -> ExternalIds {
    match imdb {
        Some(id) => ExternalIds::with_imdb(id),
        None => ExternalIds::new(),
    }
}

pub fn film(title: &str, year: Option<u32>, imdb: Option<&str>) -> FilmRecord {
    FilmRecord::new(title, year, imdb_ids(imdb))
}

pub fn entry(rating_key: &str, title: &str, year: Option<u32>, imdb: Option<&str>) -> WatchlistEntry {
    WatchlistEntry {
        rating_key: rating_key.to_string(),
        title: title.to_string(),
        year,
        media_type: PlexMediaType::Movie,
        ids: imdb_ids(imdb),
    }
}

#[derive(Default)]
pub struct FakeLetterboxd {
    pub watchlist: Vec<FilmRecord>,
    pub watched: Vec<FilmRecord>,
    pub fail_watched: bool,
}

#[async_trait]
impl LetterboxdSource for FakeLetterboxd {
    async fn get_watchlist(&self, _username: &str) -> Result<Vec<FilmRecord>, SourceError> {
        Ok(self.watchlist.clone())
    }

    async fn get_watched(&self, _username: &str) -> Result<Vec<FilmRecord>, SourceError> {
        if self.fail_watched {
            return Err(SourceError::new("connection reset"));
        }
        Ok(self.watched.clone())
    }
}

/// Plex double whose watchlist changes as add/remove calls succeed
#[derive(Default)]
pub struct FakePlex {
    pub watchlist: Mutex<Vec<WatchlistEntry>>,
    /// Discover candidates keyed by film title
    pub catalogue: HashMap<String, Vec<WatchlistEntry>>,
    /// Ids returned by `lookup_ids`, keyed by rating key
    pub metadata: HashMap<String, ExternalIds>,
    pub failing_discover: HashSet<String>,
    pub failing_lookup: HashSet<String>,
    pub failing_mutation: HashSet<String>,
    pub reject_token: bool,
    pub mutations: Mutex<Vec<String>>,
}

impl FakePlex {
    pub fn with_watchlist(entries: Vec<WatchlistEntry>) -> Self {
        Self {
            watchlist: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn with_candidate(mut self, title: &str, candidate: WatchlistEntry) -> Self {
        self.catalogue.entry(title.to_string()).or_default().push(candidate);
        self
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn rating_keys(&self) -> Vec<String> {
        self.watchlist
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.rating_key.clone())
            .collect()
    }
}

#[async_trait]
impl PlexWatchlist for FakePlex {
    async fn authenticate(&self) -> Result<(), SourceError> {
        if self.reject_token {
            return Err(SourceError::new("HTTP 401 Unauthorized"));
        }
        Ok(())
    }

    async fn get_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError> {
        Ok(self.watchlist.lock().unwrap().clone())
    }

    async fn lookup_ids(&self, entry: &WatchlistEntry) -> Result<ExternalIds, SourceError> {
        if self.failing_lookup.contains(&entry.rating_key) {
            return Err(SourceError::new("metadata request timed out"));
        }
        Ok(self.metadata.get(&entry.rating_key).cloned().unwrap_or_default())
    }

    async fn discover(&self, film: &FilmRecord) -> Result<Vec<WatchlistEntry>, SourceError> {
        if self.failing_discover.contains(&film.title) {
            return Err(SourceError::new("discover request timed out"));
        }
        Ok(self.catalogue.get(&film.title).cloned().unwrap_or_default())
    }

    async fn add_to_watchlist(&self, rating_key: &str) -> Result<(), SourceError> {
        if self.failing_mutation.contains(rating_key) {
            return Err(SourceError::new("HTTP 500"));
        }
        self.mutations.lock().unwrap().push(format!("add {}", rating_key));

        let candidate = self
            .catalogue
            .values()
            .flatten()
            .find(|c| c.rating_key == rating_key)
            .cloned();
        if let Some(candidate) = candidate {
            self.watchlist.lock().unwrap().push(candidate);
        }
        Ok(())
    }

    async fn remove_from_watchlist(&self, rating_key: &str) -> Result<(), SourceError> {
        if self.failing_mutation.contains(rating_key) {
            return Err(SourceError::new("HTTP 500"));
        }
        self.mutations.lock().unwrap().push(format!("remove {}", rating_key));
        self.watchlist.lock().unwrap().retain(|e| e.rating_key != rating_key);
        Ok(())
    }
}
