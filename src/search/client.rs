//! HTTP client for the Bing Web Search API.

use crate::config::Config;
use crate::search::types::{BingResponse, SearchError, SourceLink};
use async_trait::async_trait;
use reqwest::Client;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Interface implemented by search backends. One call, no retries.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run `query` and return hits in the order the backend ranked them.
    async fn search(&self, query: &str) -> Result<Vec<SourceLink>, SearchError>;
}

/// Bing Web Search v7 client with strict safe-search.
pub struct BingSearchClient {
    http: Client,
    endpoint: String,
    api_key: String,
    result_count: u32,
}

impl BingSearchClient {
    /// Build a client for `api_key` using endpoint, result count and timeout from configuration.
    pub fn new(config: &Config, api_key: String) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("contentlens/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        tracing::debug!(
            endpoint = %config.bing_search_url,
            result_count = config.search_result_count,
            "Initialized search client"
        );
        Ok(Self {
            http,
            endpoint: config.bing_search_url.clone(),
            api_key,
            result_count: config.search_result_count,
        })
    }
}

#[async_trait]
impl SearchClient for BingSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SourceLink>, SearchError> {
        let count = self.result_count.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("safeSearch", "Strict"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::UnexpectedStatus { status, body });
        }

        let body = response.text().await?;
        let parsed: BingResponse = serde_json::from_str(&body)
            .map_err(|error| SearchError::InvalidResponse(error.to_string()))?;
        Ok(parsed.into_links())
    }
}
