// Matching rule between Letterboxd films and Plex entries
//
// Ids decide whenever one kind is present on both sides. The fallback matcher
// is only consulted when one side carries no ids at all; two records with
// disjoint id kinds (IMDB only against TMDB only) never match.

use watchlist_sync_models::{ExternalIds, FilmRecord, WatchlistEntry};
use crate::fallback::FallbackMatcher;

fn ids_decide(a: &ExternalIds, b: &ExternalIds, fallback: impl FnOnce() -> bool) -> bool {
    match a.compare(b) {
        Some(decided) => decided,
        None if a.is_empty() || b.is_empty() => fallback(),
        None => false,
    }
}

pub fn film_matches_entry(film: &FilmRecord, entry: &WatchlistEntry, fallback: &dyn FallbackMatcher) -> bool {
    ids_decide(&film.ids, &entry.ids, || fallback.matches(film, &entry.title, entry.year))
}

pub fn films_match(a: &FilmRecord, b: &FilmRecord, fallback: &dyn FallbackMatcher) -> bool {
    ids_decide(&a.ids, &b.ids, || fallback.matches(a, &b.title, b.year))
}

/// Find the first film matching a Plex entry
pub fn find_matching_film<'a>(
    entry: &WatchlistEntry,
    films: &'a [FilmRecord],
    fallback: &dyn FallbackMatcher,
) -> Option<&'a FilmRecord> {
    films.iter().find(|film| film_matches_entry(film, entry, fallback))
}

/// Find the first Plex entry matching a film
pub fn find_matching_entry<'a>(
    film: &FilmRecord,
    entries: &'a [WatchlistEntry],
    fallback: &dyn FallbackMatcher,
) -> Option<&'a WatchlistEntry> {
    entries.iter().find(|entry| film_matches_entry(film, entry, fallback))
}
