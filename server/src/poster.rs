//! Best-effort poster enrichment. Lookups never fail a request; any error is
//! logged and reported as "no poster".

use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

#[async_trait::async_trait]
pub trait PosterLookup: Send + Sync {
    /// Poster image URL for a title, `None` on miss or failure.
    async fn poster_url(&self, title: &str) -> Option<String>;
}

/// Used when no poster provider is configured.
pub struct NoPosters;

#[async_trait::async_trait]
impl PosterLookup for NoPosters {
    async fn poster_url(&self, _title: &str) -> Option<String> {
        None
    }
}

/// TMDB movie search: the first result's poster wins.
pub struct TmdbPosters {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
}

#[derive(Deserialize)]
struct SearchMovieResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Deserialize)]
struct TmdbMovie {
    poster_path: Option<String>,
}

impl TmdbPosters {
    pub fn new(api_key: String, api_url: String, image_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, title: &str) -> reqwest::Result<Option<String>> {
        let url = format!("{}/search/movie", self.api_url);
        let response: SearchMovieResponse = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .results
            .into_iter()
            .next()
            .and_then(|m| m.poster_path)
            .map(|path| format!("{}{}", self.image_url, path)))
    }
}

#[async_trait::async_trait]
impl PosterLookup for TmdbPosters {
    async fn poster_url(&self, title: &str) -> Option<String> {
        match self.search(title).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(title, error = %e, "poster lookup failed");
                None
            }
        }
    }
}
