//! Clip search and download through the Giphy API.

use crate::error::{FreddyError, Result};
use crate::search::VideoSource;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Giphy API base URL.
const GIPHY_API_URL: &str = "https://api.giphy.com";

/// Results requested per search.
const SEARCH_LIMIT: u32 = 25;

/// How one clip is picked among the search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Random,
    First,
}

/// Giphy search client.
pub struct GiphyClient {
    client: Client,
    api_key: String,
    base_url: String,
    rating: String,
    selection: Selection,
}

impl GiphyClient {
    /// Create a new Giphy client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GIPHY_API_URL.to_string(),
            rating: "g".to_string(),
            selection: Selection::default(),
        }
    }

    /// Point the client at another server (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Content rating filter: `g`, `pg`, `pg-13` or `r`.
    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = rating.into();
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    fn pick(&self, urls: &[String]) -> Option<String> {
        match self.selection {
            Selection::First => urls.first().cloned(),
            Selection::Random => urls.choose(&mut rand::thread_rng()).cloned(),
        }
    }
}

#[async_trait]
impl VideoSource for GiphyClient {
    async fn search(&self, terms: &str) -> Result<String> {
        let url = format!("{}/v1/gifs/search", self.base_url);
        debug!("Searching Giphy for {:?}", terms);

        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", terms),
                ("api_key", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("rating", self.rating.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FreddyError::collaborator(
                "giphy",
                format!("Giphy API error ({status}): {body}"),
            ));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        let urls: Vec<String> = parsed
            .data
            .into_iter()
            .filter_map(|gif| gif.images.original_mp4.and_then(|r| r.mp4))
            .collect();

        debug!("Giphy returned {} mp4 results", urls.len());

        self.pick(&urls).ok_or_else(|| {
            FreddyError::collaborator("giphy", format!("no clips found for {terms:?}"))
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("Downloading {} to {}", url, dest.display());

        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FreddyError::collaborator(
                "download",
                format!("GET {url} returned {status}"),
            ));
        }

        let mut file = File::create(dest).await?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        if written == 0 {
            return Err(FreddyError::collaborator(
                "download",
                format!("GET {url} returned an empty body"),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Giphy"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<GifObject>,
}

#[derive(Debug, Deserialize)]
struct GifObject {
    images: GifImages,
}

#[derive(Debug, Deserialize)]
struct GifImages {
    #[serde(default)]
    original_mp4: Option<Rendition>,
}

#[derive(Debug, Deserialize)]
struct Rendition {
    #[serde(default)]
    mp4: Option<String>,
}
