use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use watchlist_sync_models::{ExternalIds, FilmRecord, PlexMediaType, WatchlistEntry};
use crate::error::SourceError;
use crate::plex::api::{PlexHttpClient, SearchKind, SearchResult, WatchlistItem as ApiWatchlistItem};
use crate::plex::guid::ids_from_guids;
use crate::traits::PlexWatchlist;

// Discover results are ordered by relevance; ids are only fetched for the head
const MAX_DISCOVER_CANDIDATES: usize = 10;

pub struct PlexClient {
    api: PlexHttpClient,
    server_url: String,
}

impl PlexClient {
    pub fn new(
        token: &str,
        server_url: impl Into<String>,
        discover_url: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let api = PlexHttpClient::new(token, discover_url, timeout).map_err(SourceError::plex)?;
        Ok(Self {
            api,
            server_url: server_url.into(),
        })
    }

    fn api_watchlist_to_entry(item: ApiWatchlistItem) -> WatchlistEntry {
        WatchlistEntry {
            ids: ids_from_guids(&item.guids),
            media_type: PlexMediaType::from_plex_type(&item.type_),
            rating_key: item.rating_key,
            title: item.title,
            year: item.year,
        }
    }

    fn search_result_to_entry(result: SearchResult) -> WatchlistEntry {
        WatchlistEntry {
            ids: ids_from_guids(&result.guids),
            media_type: PlexMediaType::from_plex_type(&result.type_),
            rating_key: result.rating_key,
            title: result.title,
            year: result.year,
        }
    }

    /// Search one Discover catalogue and fill in ids for results that came back without GUIDs
    ///
    /// A failed id lookup does not drop the candidate; it is returned alongside
    /// so the caller can tell "no match" apart from "could not check".
    async fn search_with_ids(&self, film: &FilmRecord, kind: SearchKind) -> Result<DiscoverSearch, SourceError> {
        let results = self
            .api
            .search_discover_provider(&film.title, kind)
            .await
            .map_err(SourceError::plex)?;

        let mut search = DiscoverSearch::default();
        for result in results.into_iter().take(MAX_DISCOVER_CANDIDATES) {
            let mut entry = Self::search_result_to_entry(result);
            if entry.ids.is_empty() {
                match self.lookup_ids(&entry).await {
                    Ok(ids) => entry.ids = ids,
                    Err(e) => {
                        debug!("Plex discover: no ids for '{}' ({}): {}", entry.title, entry.rating_key, e);
                        search.lookup_error.get_or_insert(e);
                    }
                }
            }
            search.candidates.push(entry);
        }
        Ok(search)
    }
}

/// Candidates from one Discover search plus the first id lookup that failed
#[derive(Default)]
struct DiscoverSearch {
    candidates: Vec<WatchlistEntry>,
    lookup_error: Option<SourceError>,
}

impl DiscoverSearch {
    fn has_match(&self, film: &FilmRecord) -> bool {
        self.candidates.iter().any(|c| film.ids.compare(&c.ids) == Some(true))
    }
}

#[async_trait]
impl PlexWatchlist for PlexClient {
    async fn authenticate(&self) -> Result<(), SourceError> {
        self.api.authenticate().await.map_err(SourceError::plex)?;

        // The watchlist lives on plex.tv; the server is only checked for reachability
        match self.api.server_identity(&self.server_url).await {
            Ok(machine_id) => debug!("Plex server {} reachable (machine id: {})", self.server_url, machine_id),
            Err(e) => warn!("Plex server {} not reachable: {:#}", self.server_url, e),
        }

        info!("Authenticated to Plex");
        Ok(())
    }

    async fn get_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError> {
        let items = self.api.get_watchlist().await.map_err(SourceError::plex)?;
        let entries: Vec<WatchlistEntry> = items.into_iter().map(Self::api_watchlist_to_entry).collect();
        info!("Plex watchlist: {} items", entries.len());
        Ok(entries)
    }

    async fn lookup_ids(&self, entry: &WatchlistEntry) -> Result<ExternalIds, SourceError> {
        let guids = self
            .api
            .get_metadata_guids(&entry.rating_key)
            .await
            .map_err(SourceError::plex)?;
        Ok(ids_from_guids(&guids))
    }

    /// Search movies first; fall back to TV results when no movie carries the
    /// film's id, since Plex files some films as TV specials
    ///
    /// When nothing matches and some candidate could not be checked (or the
    /// show search itself failed), the failure is returned instead of the
    /// partial candidate list.
    async fn discover(&self, film: &FilmRecord) -> Result<Vec<WatchlistEntry>, SourceError> {
        let mut search = self.search_with_ids(film, SearchKind::Movies).await?;
        if search.has_match(film) {
            return Ok(search.candidates);
        }

        debug!("Plex discover: no movie result for {}, searching shows", film.label());
        match self.search_with_ids(film, SearchKind::Shows).await {
            Ok(shows) => {
                search.candidates.extend(shows.candidates);
                if search.lookup_error.is_none() {
                    search.lookup_error = shows.lookup_error;
                }
            }
            Err(e) => {
                warn!("Plex discover: show search failed for {}: {}", film.label(), e);
                search.lookup_error = Some(e);
            }
        }

        if search.has_match(film) {
            return Ok(search.candidates);
        }
        match search.lookup_error {
            Some(e) => Err(e),
            None => Ok(search.candidates),
        }
    }

    async fn add_to_watchlist(&self, rating_key: &str) -> Result<(), SourceError> {
        self.api.add_to_watchlist(rating_key).await.map_err(SourceError::plex)
    }

    async fn remove_from_watchlist(&self, rating_key: &str) -> Result<(), SourceError> {
        self.api.remove_from_watchlist(rating_key).await.map_err(SourceError::plex)
    }
}
