use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// One web search per outline section. Failures here are fatal to the run;
/// the scraper below is the lenient half of the retrieval pair.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns up to `num` result URLs in ranking order. An empty Vec is a
    /// valid outcome (no results), not an error.
    async fn search(&self, query: &str, num: u32) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: &str, engine_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str, num: u32) -> Result<Vec<String>> {
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("q", query),
                ("key", &self.api_key),
                ("cx", &self.engine_id),
                ("num", &num.to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to search API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search API error ({}): {}", status, body);
        }

        let api_response: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search API response")?;

        Ok(api_response.items.into_iter().map(|item| item.link).collect())
    }
}
