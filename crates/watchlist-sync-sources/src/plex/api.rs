use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};
use crate::plex::guid::parse_guid_array;

const PLEX_TV_BASE_URL: &str = "https://plex.tv";
const CLIENT_IDENTIFIER: &str = "letterplex";
const WATCHLIST_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct WatchlistItem {
    pub rating_key: String,
    pub type_: String,
    pub title: String,
    pub year: Option<u32>,
    pub guids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub rating_key: String,
    pub type_: String,
    pub title: String,
    pub year: Option<u32>,
    pub guids: Vec<String>,
}

/// Which Discover catalogue to search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Movies,
    Shows,
}

impl SearchKind {
    // Discover provider search requires searchProviders and searchTypes parameters
    fn query_params(self) -> (&'static str, &'static str) {
        match self {
            SearchKind::Movies => ("discover,PLEXAVOD", "movies"),
            SearchKind::Shows => ("discover,PLEXTVOD", "tv"),
        }
    }
}

pub struct PlexHttpClient {
    client: Client,
    discover_base_url: String,
}

impl PlexHttpClient {
    pub fn new(token: &str, discover_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(token)
                        .context("Invalid token format")?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-product"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            discover_base_url: discover_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/api/v2/user", PLEX_TV_BASE_URL);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to authenticate with Plex")?;

        if response.status().is_success() {
            debug!("Plex authentication successful");
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Plex authentication failed: {}",
                response.status()
            ))
        }
    }

    /// Fetch the server's identity endpoint, returning its machine identifier
    pub async fn server_identity(&self, server_url: &str) -> Result<String> {
        let url = format!("{}/identity", server_url.trim_end_matches('/'));
        let json = self.get_json(&url, "Failed to reach Plex server").await?;
        Ok(json
            .get("MediaContainer")
            .and_then(|mc| mc.get("machineIdentifier"))
            .and_then(|id| id.as_str())
            .unwrap_or("unknown")
            .to_string())
    }

    /// Fetch the whole account watchlist, page by page
    pub async fn get_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        let mut watchlist = Vec::new();
        let mut start = 0;

        loop {
            let url = format!(
                "{}/library/sections/watchlist/all?includeGuids=1&X-Plex-Container-Start={}&X-Plex-Container-Size={}",
                self.discover_base_url, start, WATCHLIST_PAGE_SIZE
            );
            let json = self.get_json(&url, "Failed to get watchlist").await?;
            let (page, total_size) = parse_watchlist_page(&json)?;
            let page_len = page.len();
            debug!("Plex watchlist page at {}: {} items (total: {:?})", start, page_len, total_size);
            watchlist.extend(page);
            start += page_len;

            let exhausted = match total_size {
                Some(total) => start >= total,
                None => page_len < WATCHLIST_PAGE_SIZE,
            };
            if exhausted || page_len == 0 {
                break;
            }
        }

        debug!("Plex watchlist: Returning {} items", watchlist.len());
        Ok(watchlist)
    }

    /// Fetch GUIDs for a single Discover item
    pub async fn get_metadata_guids(&self, rating_key: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/library/metadata/{}?includeGuids=1",
            self.discover_base_url,
            urlencoding::encode(rating_key)
        );
        let json = self.get_json(&url, "Failed to get metadata").await?;
        let item = json
            .get("MediaContainer")
            .and_then(|mc| mc.get("Metadata"))
            .and_then(|m| m.as_array())
            .and_then(|items| items.first())
            .ok_or_else(|| anyhow::anyhow!("Metadata item {} not found", rating_key))?;
        Ok(parse_guid_array(item.get("Guid").unwrap_or(&Value::Null)))
    }

    pub async fn add_to_watchlist(&self, rating_key: &str) -> Result<()> {
        self.watchlist_action("addToWatchlist", rating_key)
            .await
            .context("Failed to add to watchlist")
    }

    pub async fn remove_from_watchlist(&self, rating_key: &str) -> Result<()> {
        self.watchlist_action("removeFromWatchlist", rating_key)
            .await
            .context("Failed to remove from watchlist")
    }

    async fn watchlist_action(&self, action: &str, rating_key: &str) -> Result<()> {
        let url = format!(
            "{}/actions/{}?ratingKey={}",
            self.discover_base_url,
            action,
            urlencoding::encode(rating_key)
        );
        let response = self.client.put(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{} returned {}", action, response.status()))
        }
    }

    /// Search the Discover provider for items not in a local library
    ///
    /// The search is by title only. Letterboxd and Plex disagree on release
    /// years often enough that a year filter hides real matches.
    pub async fn search_discover_provider(
        &self,
        title: &str,
        kind: SearchKind,
    ) -> Result<Vec<SearchResult>> {
        let (search_providers, search_types) = kind.query_params();
        let url = format!(
            "{}/library/search?query={}&includeGuids=1&limit=20&searchProviders={}&searchTypes={}",
            self.discover_base_url,
            urlencoding::encode(title),
            search_providers,
            search_types
        );
        debug!("Plex discover provider search: '{}' ({:?})", title, kind);
        let json = self.get_json(&url, "Failed to search Plex discover provider").await?;

        if let Some(error) = json.get("Error") {
            let error_msg = error.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(anyhow::anyhow!("Plex discover provider API error: {}", error_msg));
        }

        let results = parse_search_results(&json);
        debug!("Plex discover provider search: Found {} results for '{}'", results.len(), title);
        Ok(results)
    }

    async fn get_json(&self, url: &str, context: &'static str) -> Result<Value> {
        let response = self.client.get(url).send().await.context(context)?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("{}: HTTP {}", context, status));
        }

        let json: Value = response
            .json()
            .await
            .with_context(|| format!("{}: unparseable response", context))?;
        trace!("Plex response from {}: {}", url, json);
        Ok(json)
    }
}

/// Parse one watchlist page, returning its items and the reported total size
pub fn parse_watchlist_page(json: &Value) -> Result<(Vec<WatchlistItem>, Option<usize>)> {
    let media_container = json
        .get("MediaContainer")
        .ok_or_else(|| anyhow::anyhow!("Watchlist response has no MediaContainer"))?;

    let total_size = media_container
        .get("totalSize")
        .and_then(|t| t.as_u64().or_else(|| t.as_str().and_then(|s| s.parse().ok())))
        .map(|t| t as usize);

    let mut items = Vec::new();
    if let Some(meta_array) = media_container.get("Metadata").and_then(|m| m.as_array()) {
        for item in meta_array {
            let rating_key = match item.get("ratingKey").and_then(|k| k.as_str()) {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => {
                    debug!("Plex watchlist: skipping item without ratingKey: {:?}", item.get("title"));
                    continue;
                }
            };
            items.push(WatchlistItem {
                rating_key,
                type_: str_field(item, "type"),
                title: str_field(item, "title"),
                year: year_field(item),
                guids: parse_guid_array(item.get("Guid").unwrap_or(&Value::Null)),
            });
        }
    }

    Ok((items, total_size))
}

/// Parse a Discover search response
///
/// Results arrive grouped as `SearchResults[].SearchResult[].Metadata`; older
/// responses put items directly under `Metadata`.
pub fn parse_search_results(json: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let Some(media_container) = json.get("MediaContainer") else {
        return results;
    };

    if let Some(groups) = media_container.get("SearchResults").and_then(|v| v.as_array()) {
        for group in groups {
            let Some(entries) = group.get("SearchResult").and_then(|v| v.as_array()) else {
                continue;
            };
            for entry in entries {
                if let Some(metadata) = entry.get("Metadata") {
                    if let Some(result) = parse_search_metadata(metadata) {
                        results.push(result);
                    }
                }
            }
        }
    }

    if results.is_empty() {
        if let Some(items) = media_container.get("Metadata").and_then(|v| v.as_array()) {
            results.extend(items.iter().filter_map(parse_search_metadata));
        }
    }

    results
}

fn parse_search_metadata(metadata: &Value) -> Option<SearchResult> {
    let rating_key = metadata.get("ratingKey")?.as_str()?.to_string();
    let title = metadata.get("title")?.as_str()?.to_string();
    Some(SearchResult {
        rating_key,
        type_: str_field(metadata, "type"),
        title,
        year: year_field(metadata),
        guids: parse_guid_array(metadata.get("Guid").unwrap_or(&Value::Null)),
    })
}

fn str_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn year_field(item: &Value) -> Option<u32> {
    item.get("year").and_then(|y| y.as_u64()).map(|y| y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_watchlist_page() {
        let json = json!({
            "MediaContainer": {
                "totalSize": 2,
                "Metadata": [
                    {
                        "ratingKey": "5d776825880197001ec967c1",
                        "type": "movie",
                        "title": "The Matrix",
                        "year": 1999,
                        "Guid": [{"id": "imdb://tt0133093"}, {"id": "tmdb://603"}]
                    },
                    {"ratingKey": "5d9c086c", "type": "show", "title": "Twin Peaks"},
                    {"type": "movie", "title": "Missing key"}
                ]
            }
        });

        let (items, total) = parse_watchlist_page(&json).unwrap();
        assert_eq!(total, Some(2));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "The Matrix");
        assert_eq!(items[0].year, Some(1999));
        assert_eq!(items[0].guids, vec!["imdb://tt0133093", "tmdb://603"]);
        assert_eq!(items[1].type_, "show");
        assert!(items[1].guids.is_empty());
    }

    #[test]
    fn test_parse_watchlist_page_without_container() {
        assert!(parse_watchlist_page(&json!({"errors": []})).is_err());
    }

    #[test]
    fn test_parse_search_results_grouped() {
        let json = json!({
            "MediaContainer": {
                "SearchResults": [
                    {
                        "id": "external",
                        "SearchResult": [
                            {"score": 0.92, "Metadata": {
                                "ratingKey": "5d776825880197001ec967c1",
                                "type": "movie",
                                "title": "The Matrix",
                                "year": 1999,
                                "Guid": [{"id": "imdb://tt0133093"}]
                            }},
                            {"score": 0.40, "Metadata": {"title": "No key"}}
                        ]
                    }
                ]
            }
        });

        let results = parse_search_results(&json);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rating_key, "5d776825880197001ec967c1");
        assert_eq!(results[0].guids, vec!["imdb://tt0133093"]);
    }

    #[test]
    fn test_parse_search_results_flat_fallback() {
        let json = json!({
            "MediaContainer": {
                "Metadata": [{"ratingKey": "abc", "type": "movie", "title": "Alien", "year": 1979}]
            }
        });
        let results = parse_search_results(&json);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].year, Some(1979));
        assert!(parse_search_results(&json!({})).is_empty());
    }
}
