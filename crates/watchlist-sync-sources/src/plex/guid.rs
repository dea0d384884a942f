// Plex GUID parsing
//
// GUIDs can be in formats like:
// - "imdb://tt1234567"
// - "tmdb://603"
// - "com.plexapp.agents.imdb://tt1234567?lang=en"
// - "plex://movie/5d776b5e1e5c36001f8e9b8a" (Plex-internal, ignored)

use serde_json::Value;
use watchlist_sync_models::ExternalIds;

/// Collect GUID strings from a `Guid` field
///
/// The field is usually an array of `{"id": "..."}` objects, but single
/// objects and bare strings show up in older responses.
pub fn parse_guid_array(guid_value: &Value) -> Vec<String> {
    let mut guids = Vec::new();
    if let Some(guid_array) = guid_value.as_array() {
        for guid_obj in guid_array {
            if let Some(id) = guid_obj.get("id").and_then(|i| i.as_str()) {
                guids.push(id.to_string());
            } else if let Some(id_str) = guid_obj.as_str() {
                guids.push(id_str.to_string());
            }
        }
    } else if let Some(id) = guid_value.get("id").and_then(|i| i.as_str()) {
        guids.push(id.to_string());
    } else if let Some(id_str) = guid_value.as_str() {
        guids.push(id_str.to_string());
    }
    guids
}

/// Extract all external ids from a list of GUIDs; the first of each kind wins
pub fn ids_from_guids(guids: &[String]) -> ExternalIds {
    let mut ids = ExternalIds::default();
    for guid in guids {
        if ids.imdb_id.is_none() {
            ids.imdb_id = parse_imdb_from_guid(guid);
        }
        if ids.tmdb_id.is_none() {
            ids.tmdb_id = parse_tmdb_from_guid(guid);
        }
    }
    ids
}

/// Parse IMDB ID from a Plex GUID string
pub fn parse_imdb_from_guid(guid: &str) -> Option<String> {
    let id = guid_value(guid, "imdb://")?;
    // tt followed by at least 7 digits
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Parse TMDB ID from a Plex GUID string
pub fn parse_tmdb_from_guid(guid: &str) -> Option<u32> {
    guid_value(guid, "tmdb://")?.parse::<u32>().ok()
}

fn guid_value<'a>(guid: &'a str, scheme: &str) -> Option<&'a str> {
    let start = guid.find(scheme)? + scheme.len();
    guid[start..]
        .split(['?', '&', '>'])
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
