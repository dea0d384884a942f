use serde::{Deserialize, Serialize};

/// Cross-service film identifiers
///
/// Letterboxd exposes both an IMDB and a TMDB id per film, Plex carries them
/// as `imdb://` / `tmdb://` GUIDs. Either side may be missing any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExternalIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u32>,
}

impl ExternalIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imdb(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: normalize_imdb(imdb_id.into()),
            tmdb_id: None,
        }
    }

    pub fn with_tmdb(mut self, tmdb_id: u32) -> Self {
        self.tmdb_id = Some(tmdb_id);
        self
    }

    /// Check if all ID fields are empty
    pub fn is_empty(&self) -> bool {
        self.imdb_id.is_none() && self.tmdb_id.is_none()
    }

    /// Merge IDs from another source, only filling in None values.
    pub fn merge(&mut self, other: &ExternalIds) {
        if self.imdb_id.is_none() {
            self.imdb_id = other.imdb_id.clone();
        }
        if self.tmdb_id.is_none() {
            self.tmdb_id = other.tmdb_id;
        }
    }

    /// Compare against another set of ids.
    ///
    /// Returns `Some(true)` / `Some(false)` as soon as an id kind is present on
    /// both sides (IMDB first, then TMDB), and `None` when no id kind can be
    /// compared. The first comparable kind is final: a differing IMDB id is
    /// never overridden by an equal TMDB id.
    pub fn compare(&self, other: &ExternalIds) -> Option<bool> {
        if let (Some(a), Some(b)) = (&self.imdb_id, &other.imdb_id) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (self.tmdb_id, other.tmdb_id) {
            return Some(a == b);
        }
        None
    }

    /// Best id for log lines and reports
    pub fn display_id(&self) -> Option<String> {
        self.imdb_id
            .clone()
            .or_else(|| self.tmdb_id.map(|id| format!("tmdb:{}", id)))
    }
}

/// Trim an IMDB id and map blank values to `None`
pub fn normalize_imdb(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
