use chrono::{DateTime, Utc};
use serde::Serialize;
use watchlist_sync_models::{FilmRecord, UnmatchedReason, WatchlistEntry};

/// A film named in the report
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportedItem {
    pub title: String,
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,
}

impl ReportedItem {
    pub fn from_entry(entry: &WatchlistEntry) -> Self {
        Self {
            title: entry.title.clone(),
            year: entry.year,
            external_id: entry.ids.display_id(),
            rating_key: Some(entry.rating_key.clone()),
        }
    }

    pub fn from_film(film: &FilmRecord, rating_key: Option<&str>) -> Self {
        Self {
            title: film.title.clone(),
            year: film.year,
            external_id: film.ids.display_id(),
            rating_key: rating_key.map(|k| k.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnmatchedFilm {
    #[serde(flatten)]
    pub film: ReportedItem,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Remove,
    Add,
}

/// A watchlist mutation that failed without aborting the run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedAction {
    pub action: ActionKind,
    #[serde(flatten)]
    pub item: ReportedItem,
    pub error: String,
}

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub dry_run: bool,
    pub fallback_matcher: String,
    /// Removed from Plex (or planned, in a dry run)
    pub removed: Vec<ReportedItem>,
    /// Added to Plex (or planned, in a dry run)
    pub added: Vec<ReportedItem>,
    pub already_present: usize,
    /// On the Letterboxd watchlist but already watched, so never added
    pub skipped_watched: Vec<ReportedItem>,
    /// Letterboxd watchlist films that could not be resolved on Plex
    pub unmatched: Vec<UnmatchedFilm>,
    /// Plex watchlist entries whose id lookup failed; they were only checked
    /// for removal through the fallback matcher
    pub plex_lookup_failed: Vec<UnmatchedFilm>,
    pub failed: Vec<FailedAction>,
    /// On Plex but on neither Letterboxd list
    pub plex_only: usize,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool, fallback_matcher: &str) -> Self {
        Self {
            started_at,
            duration_secs: 0.0,
            dry_run,
            fallback_matcher: fallback_matcher.to_string(),
            removed: Vec::new(),
            added: Vec::new(),
            already_present: 0,
            skipped_watched: Vec::new(),
            unmatched: Vec::new(),
            plex_lookup_failed: Vec::new(),
            failed: Vec::new(),
            plex_only: 0,
        }
    }

    pub fn has_problems(&self) -> bool {
        !self.unmatched.is_empty() || !self.plex_lookup_failed.is_empty() || !self.failed.is_empty()
    }
}
