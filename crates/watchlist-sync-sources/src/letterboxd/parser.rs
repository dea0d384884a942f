// Parser for letterboxd-list-radarr JSON payloads
//
// Each list endpoint returns an array like:
// [{"id": 278, "imdb_id": "tt0111161", "title": "The Shawshank Redemption",
//   "release_year": "1994", "clean_title": "/film/the-shawshank-redemption/", "adult": false}]
// `release_year` and `id` show up both as strings and numbers, `imdb_id` may be
// empty or null for films Letterboxd has not linked to IMDB.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use watchlist_sync_models::{ExternalIds, FilmRecord};
use watchlist_sync_models::external_ids::normalize_imdb;

#[derive(Debug, Deserialize)]
struct RawFilm {
    title: Option<String>,
    #[serde(default)]
    release_year: Option<Value>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    clean_title: Option<String>,
}

/// Parse a list payload into film records
///
/// Returns an error message when the payload is not a film array (the service
/// answers unknown users and private lists with `{"message": "..."}`).
pub fn parse_films(body: &str) -> Result<Vec<FilmRecord>, String> {
    let json: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(ref obj) => {
            let message = obj
                .get("message")
                .or_else(|| obj.get("error"))
                .and_then(|m| m.as_str())
                .unwrap_or("expected a list of films");
            return Err(message.to_string());
        }
        _ => return Err("expected a list of films".to_string()),
    };

    let mut films = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (idx, item) in items.into_iter().enumerate() {
        let raw: RawFilm = serde_json::from_value(item)
            .map_err(|e| format!("film[{}]: {}", idx, e))?;
        match into_film(raw) {
            Some(film) => films.push(film),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Letterboxd parser: skipped {} entries without a title", skipped);
    }
    Ok(films)
}

fn into_film(raw: RawFilm) -> Option<FilmRecord> {
    let title = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;

    let mut ids = ExternalIds::new();
    ids.imdb_id = raw.imdb_id.and_then(normalize_imdb);
    ids.tmdb_id = raw.id.as_ref().and_then(value_as_u32);

    let year = raw.release_year.as_ref().and_then(value_as_u32).filter(|y| *y > 0);
    let slug = raw.clean_title.as_deref().and_then(slug_from_path);

    trace!("Letterboxd film: title={}, year={:?}, ids={:?}", title, year, ids);

    Some(FilmRecord { title, year, ids, slug })
}

fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// "/film/the-matrix/" -> "the-matrix"
fn slug_from_path(path: &str) -> Option<String> {
    path.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
