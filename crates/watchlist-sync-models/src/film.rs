use serde::{Deserialize, Serialize};
use crate::external_ids::ExternalIds;

/// A film as known to Letterboxd
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilmRecord {
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: ExternalIds,
    /// Letterboxd film slug, e.g. "the-shawshank-redemption"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl FilmRecord {
    pub fn new(title: impl Into<String>, year: Option<u32>, ids: ExternalIds) -> Self {
        Self {
            title: title.into(),
            year,
            ids,
            slug: None,
        }
    }

    /// "Title (Year)" for log lines
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}
