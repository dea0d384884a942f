use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use watchlist_sync_models::FilmRecord;
use crate::error::SourceError;
use crate::letterboxd::parser::parse_films;
use crate::traits::LetterboxdSource;

const FETCH_ATTEMPTS: usize = 3;

/// Client for the letterboxd-list-radarr service
///
/// The service scrapes Letterboxd on demand, so a cold request for a large
/// list can take tens of seconds.
pub struct LetterboxdClient {
    client: Client,
    base_url: String,
}

impl LetterboxdClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("letterplex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::http("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn list_url(&self, username: &str, list: &str) -> String {
        format!("{}/{}/{}/", self.base_url, urlencoding::encode(username), list)
    }

    /// Fetch a list, retrying transport errors, bad statuses and unparseable bodies
    async fn fetch_list(&self, username: &str, list: &str) -> Result<Vec<FilmRecord>, SourceError> {
        let mut attempt = 1;
        loop {
            match self.fetch_list_once(username, list).await {
                Ok(films) => return Ok(films),
                Err(e) if attempt < FETCH_ATTEMPTS => {
                    warn!("Attempt {} of {} failed, retrying: {}", attempt, FETCH_ATTEMPTS, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_list_once(&self, username: &str, list: &str) -> Result<Vec<FilmRecord>, SourceError> {
        let url = self.list_url(username, list);
        let context = format!("Letterboxd {} for '{}'", list, username);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::http(context.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { context, status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::http(context.clone(), e))?;

        let films = parse_films(&body).map_err(|message| SourceError::malformed(context, message))?;
        debug!("Letterboxd {}: {} films", list, films.len());
        Ok(films)
    }
}

#[async_trait]
impl LetterboxdSource for LetterboxdClient {
    async fn get_watchlist(&self, username: &str) -> Result<Vec<FilmRecord>, SourceError> {
        info!("Fetching Letterboxd watchlist for '{}' (this may take a while)", username);
        self.fetch_list(username, "watchlist").await
    }

    async fn get_watched(&self, username: &str) -> Result<Vec<FilmRecord>, SourceError> {
        info!("Fetching Letterboxd watched films for '{}' (this may take a while)", username);
        self.fetch_list(username, "films").await
    }
}
