use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of correlating a Letterboxd film with a Plex item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    Matched { rating_key: String },
    Unmatched { reason: UnmatchedReason },
}

impl MatchResult {
    pub fn matched(rating_key: impl Into<String>) -> Self {
        MatchResult::Matched {
            rating_key: rating_key.into(),
        }
    }

    pub fn unmatched(reason: UnmatchedReason) -> Self {
        MatchResult::Unmatched { reason }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// The film carries no IMDB/TMDB id and nothing matched by title/year
    NoExternalId,
    /// Discover returned no results at all
    NotFound,
    /// Discover returned results, none carrying the film's id
    NoConfidentMatch,
    /// Several distinct Plex items carry the film's id
    Ambiguous,
    LookupError(String),
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::NoExternalId => write!(f, "no external identifier"),
            UnmatchedReason::NotFound => write!(f, "not found on Plex Discover"),
            UnmatchedReason::NoConfidentMatch => write!(f, "no Discover result with a matching identifier"),
            UnmatchedReason::Ambiguous => write!(f, "ambiguous Discover result"),
            UnmatchedReason::LookupError(msg) => write!(f, "lookup error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display() {
        assert_eq!(UnmatchedReason::NoExternalId.to_string(), "no external identifier");
        assert_eq!(
            UnmatchedReason::LookupError("timeout".to_string()).to_string(),
            "lookup error: timeout"
        );
    }

    #[test]
    fn test_match_result_serializes_tagged() {
        let json = serde_json::to_value(MatchResult::unmatched(UnmatchedReason::NotFound)).unwrap();
        assert_eq!(json["result"], "unmatched");
        assert_eq!(json["reason"]["kind"], "not_found");

        let json = serde_json::to_value(MatchResult::matched("5d77")).unwrap();
        assert_eq!(json["result"], "matched");
        assert_eq!(json["rating_key"], "5d77");
    }
}
