use serde::{Deserialize, Serialize};
use crate::external_ids::ExternalIds;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlexMediaType {
    Movie,
    Show,
    Other,
}

impl PlexMediaType {
    pub fn from_plex_type(type_: &str) -> Self {
        match type_ {
            "movie" => PlexMediaType::Movie,
            "show" => PlexMediaType::Show,
            _ => PlexMediaType::Other,
        }
    }
}

/// A film as known to the Plex watchlist (or a Discover search result)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    /// Discover provider rating key, used for add/remove calls
    pub rating_key: String,
    pub title: String,
    pub year: Option<u32>,
    pub media_type: PlexMediaType,
    #[serde(default)]
    pub ids: ExternalIds,
}

impl WatchlistEntry {
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}
