// Reconciliation between the Letterboxd lists and the Plex watchlist

use std::collections::HashSet;
use tracing::{debug, warn};
use watchlist_sync_models::{FilmRecord, MatchResult, PlexMediaType, UnmatchedReason, WatchlistEntry};
use watchlist_sync_sources::PlexWatchlist;
use crate::fallback::FallbackMatcher;
use crate::id_matching::{film_matches_entry, films_match, find_matching_entry, find_matching_film};


/// A Letterboxd film resolved to a Plex Discover item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAddition {
    pub film: FilmRecord,
    pub rating_key: String,
}

#[derive(Debug, Default)]
pub struct Additions {
    pub to_add: Vec<PlannedAddition>,
    pub already_present: usize,
    pub unmatched: Vec<(FilmRecord, UnmatchedReason)>,
}

/// Plex entries that correspond to a watched Letterboxd film
///
/// The result is a subset of `plex_watchlist`, deduplicated by rating key.
/// Entries that match nothing (including those without comparable ids and
/// no confident fallback match) are never returned.
pub fn compute_removals(
    plex_watchlist: &[WatchlistEntry],
    letterboxd_watched: &[FilmRecord],
    fallback: &dyn FallbackMatcher,
) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    let mut to_remove = Vec::new();

    for entry in plex_watchlist {
        if let Some(film) = find_matching_film(entry, letterboxd_watched, fallback) {
            if seen.insert(entry.rating_key.as_str()) {
                debug!("{} already watched on Letterboxd as {}, removing", entry.label(), film.label());
                to_remove.push(entry.clone());
            }
        }
    }

    debug!(
        "compute_removals: plex_count={}, watched_count={}, to_remove={}",
        plex_watchlist.len(),
        letterboxd_watched.len(),
        to_remove.len()
    );
    to_remove
}

/// Split the Letterboxd watchlist into films still to watch and films already watched
///
/// A film on both lists counts as watched.
pub fn exclude_watched(
    letterboxd_watchlist: &[FilmRecord],
    letterboxd_watched: &[FilmRecord],
    fallback: &dyn FallbackMatcher,
) -> (Vec<FilmRecord>, Vec<FilmRecord>) {
    letterboxd_watchlist
        .iter()
        .cloned()
        .partition(|film| {
            !letterboxd_watched
                .iter()
                .any(|watched| films_match(film, watched, fallback))
        })
}

/// Plex entries on neither Letterboxd list
pub fn plex_only<'a>(
    plex_watchlist: &'a [WatchlistEntry],
    letterboxd_watchlist: &[FilmRecord],
    letterboxd_watched: &[FilmRecord],
    fallback: &dyn FallbackMatcher,
) -> Vec<&'a WatchlistEntry> {
    plex_watchlist
        .iter()
        .filter(|entry| {
            !letterboxd_watchlist
                .iter()
                .chain(letterboxd_watched.iter())
                .any(|film| film_matches_entry(film, entry, fallback))
        })
        .collect()
}

/// Pick the Discover candidate carrying the film's id
pub fn select_candidate(film: &FilmRecord, candidates: &[WatchlistEntry]) -> MatchResult {
    if candidates.is_empty() {
        return MatchResult::unmatched(UnmatchedReason::NotFound);
    }

    let mut matching: Vec<&WatchlistEntry> = Vec::new();
    for candidate in candidates {
        if film.ids.compare(&candidate.ids) == Some(true)
            && !matching.iter().any(|m| m.rating_key == candidate.rating_key)
        {
            matching.push(candidate);
        }
    }

    match matching.as_slice() {
        [] => MatchResult::unmatched(UnmatchedReason::NoConfidentMatch),
        [only] => MatchResult::matched(only.rating_key.clone()),
        several => {
            // A movie and its TV-special twin can share an id; prefer the movie
            let movies: Vec<&&WatchlistEntry> = several
                .iter()
                .filter(|c| c.media_type == PlexMediaType::Movie)
                .collect();
            match movies.as_slice() {
                [movie] => MatchResult::matched(movie.rating_key.clone()),
                _ => MatchResult::unmatched(UnmatchedReason::Ambiguous),
            }
        }
    }
}

/// Resolves additions against Plex Discover
pub struct Reconciler<'a> {
    plex: &'a dyn PlexWatchlist,
    fallback: &'a dyn FallbackMatcher,
}

impl<'a> Reconciler<'a> {
    pub fn new(plex: &'a dyn PlexWatchlist, fallback: &'a dyn FallbackMatcher) -> Self {
        Self { plex, fallback }
    }

    pub fn compute_removals(
        &self,
        plex_watchlist: &[WatchlistEntry],
        letterboxd_watched: &[FilmRecord],
    ) -> Vec<WatchlistEntry> {
        compute_removals(plex_watchlist, letterboxd_watched, self.fallback)
    }

    /// Resolve one film to a Plex identifier
    ///
    /// Lookup failures are reported as `Unmatched(LookupError)` instead of
    /// being propagated.
    pub async fn resolve(&self, film: &FilmRecord) -> MatchResult {
        if film.ids.is_empty() {
            return MatchResult::unmatched(UnmatchedReason::NoExternalId);
        }

        match self.plex.discover(film).await {
            Ok(candidates) => {
                debug!("Discover returned {} candidates for {}", candidates.len(), film.label());
                select_candidate(film, &candidates)
            }
            Err(e) => {
                warn!("Discover lookup failed for {}: {}", film.label(), e);
                MatchResult::unmatched(UnmatchedReason::LookupError(e.to_string()))
            }
        }
    }

    /// Films on the Letterboxd watchlist that are not yet on Plex, resolved to Plex identifiers
    ///
    /// Never returns a film already present in `plex_watchlist`, and never the
    /// same Plex identifier twice.
    pub async fn compute_additions(
        &self,
        plex_watchlist: &[WatchlistEntry],
        letterboxd_watchlist: &[FilmRecord],
    ) -> Additions {
        let present_keys: HashSet<&str> = plex_watchlist.iter().map(|e| e.rating_key.as_str()).collect();
        let mut planned_keys: HashSet<String> = HashSet::new();
        let mut additions = Additions::default();

        for film in letterboxd_watchlist {
            if let Some(entry) = find_matching_entry(film, plex_watchlist, self.fallback) {
                debug!("{} already on Plex watchlist as {}", film.label(), entry.label());
                additions.already_present += 1;
                continue;
            }

            match self.resolve(film).await {
                MatchResult::Matched { rating_key } => {
                    if present_keys.contains(rating_key.as_str()) {
                        debug!("{} resolved to {} which is already on Plex", film.label(), rating_key);
                        additions.already_present += 1;
                    } else if planned_keys.insert(rating_key.clone()) {
                        additions.to_add.push(PlannedAddition {
                            film: film.clone(),
                            rating_key,
                        });
                    } else {
                        debug!("{} resolved to {} which is already planned", film.label(), rating_key);
                    }
                }
                MatchResult::Unmatched { reason } => {
                    debug!("Could not resolve {}: {}", film.label(), reason);
                    additions.unmatched.push((film.clone(), reason));
                }
            }
        }

        debug!(
            "compute_additions: watchlist_count={}, to_add={}, already_present={}, unmatched={}",
            letterboxd_watchlist.len(),
            additions.to_add.len(),
            additions.already_present,
            additions.unmatched.len()
        );
        additions
    }
}
