//! Related-source lookup with bounded retry and URL de-duplication.

use crate::config::Config;
use crate::search::client::{BingSearchClient, SearchClient};
use crate::search::types::SourceLink;
use std::collections::HashSet;
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Finds links related to a query. Never fails: every failure degrades to an empty list.
///
/// Transport failures are retried until the attempt counter reaches the configured limit, so a
/// limit of `n` allows `n` attempts in total and a limit of `0` still allows the first one.
/// Malformed payloads and empty result sets are final.
pub struct SourceFinder {
    client: Option<Box<dyn SearchClient>>,
    retry_limit: u32,
    backoff: Duration,
}

impl SourceFinder {
    /// Wrap `client` with the given retry limit and no backoff.
    pub fn new(client: Box<dyn SearchClient>, retry_limit: u32) -> Self {
        Self {
            client: Some(client),
            retry_limit,
            backoff: Duration::ZERO,
        }
    }

    /// A finder that always returns no sources.
    pub fn disabled() -> Self {
        Self {
            client: None,
            retry_limit: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Sleep `backoff * attempt` (capped at five seconds) between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Build the Bing-backed finder, or a disabled one when no search credential is configured.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let Some(api_key) = config.bing_api_key.clone() else {
            tracing::warn!("BING_API_KEY not set; alternative source lookup disabled");
            return Ok(Self::disabled());
        };
        let client = BingSearchClient::new(config, api_key)?;
        Ok(Self::new(Box::new(client), config.search_retry_limit)
            .with_backoff(config.search_retry_backoff))
    }

    /// Search for `query` and return de-duplicated links.
    pub async fn find_sources(&self, query: &str) -> Vec<SourceLink> {
        let Some(client) = self.client.as_deref() else {
            tracing::debug!("Search disabled; returning no sources");
            return Vec::new();
        };

        let mut attempt: u32 = 0;
        loop {
            match client.search(query).await {
                Ok(links) => {
                    let links = dedupe_by_url(links);
                    tracing::debug!(attempt, sources = links.len(), "Search completed");
                    return links;
                }
                Err(error) if error.is_transport() => {
                    attempt += 1;
                    if attempt >= self.retry_limit {
                        tracing::error!(
                            attempts = attempt,
                            error = %error,
                            "Search retry limit reached; returning no sources"
                        );
                        return Vec::new();
                    }
                    tracing::warn!(attempt, error = %error, "Search request failed; retrying");
                    let delay = self.backoff.saturating_mul(attempt).min(MAX_BACKOFF);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Search response unusable; returning no sources");
                    return Vec::new();
                }
            }
        }
    }
}

/// Drop links whose URL was already seen, keeping the first occurrence and relative order.
pub fn dedupe_by_url(links: Vec<SourceLink>) -> Vec<SourceLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn link(url: &str, title: &str) -> SourceLink {
        SourceLink {
            title: Some(title.into()),
            url: url.into(),
            snippet: None,
        }
    }

    enum Script {
        Links(Vec<SourceLink>),
        FailTransport,
        FailTransportThen(u32, Vec<SourceLink>),
        Malformed,
    }

    struct ScriptedClient {
        script: Script,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl SearchClient for ScriptedClient {
        async fn search(&self, _query: &str) -> Result<Vec<SourceLink>, SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let unavailable = || SearchError::UnexpectedStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "busy".into(),
            };
            match &self.script {
                Script::Links(links) => Ok(links.clone()),
                Script::FailTransport => Err(unavailable()),
                Script::FailTransportThen(failures, links) if call > *failures => Ok(links.clone()),
                Script::FailTransportThen(..) => Err(unavailable()),
                Script::Malformed => Err(SearchError::InvalidResponse("bad".into())),
            }
        }
    }

    fn finder(script: Script, retry_limit: u32) -> (SourceFinder, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let client = ScriptedClient {
            script,
            calls: calls.clone(),
        };
        (SourceFinder::new(Box::new(client), retry_limit), calls)
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        let links = vec![link("A", "first"), link("B", "b"), link("A", "second")];
        assert_eq!(dedupe_by_url(links), vec![link("A", "first"), link("B", "b")]);
    }

    #[tokio::test]
    async fn returns_deduplicated_links() {
        let (finder, calls) = finder(
            Script::Links(vec![link("A", "a"), link("B", "b"), link("A", "again")]),
            3,
        );
        let links = finder.find_sources("query").await;
        assert_eq!(links, vec![link("A", "a"), link("B", "b")]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_retries_makes_exactly_limit_attempts() {
        let (finder, calls) = finder(Script::FailTransport, 3);
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_limit_makes_a_single_attempt() {
        let (finder, calls) = finder(Script::FailTransport, 0);
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_when_a_retry_succeeds() {
        let (finder, calls) = finder(Script::FailTransportThen(2, vec![link("A", "a")]), 3);
        assert_eq!(finder.find_sources("query").await, vec![link("A", "a")]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_retried() {
        let (finder, calls) = finder(Script::Malformed, 5);
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_results_are_not_retried() {
        let (finder, calls) = finder(Script::Links(Vec::new()), 5);
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_linearly_between_attempts() {
        let (finder, calls) = finder(Script::FailTransport, 3);
        let finder = finder.with_backoff(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "slept {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_backoff_saturates_at_the_cap() {
        let (finder, calls) = finder(Script::FailTransport, 3);
        let finder = finder.with_backoff(Duration::MAX);
        let started = tokio::time::Instant::now();
        assert!(finder.find_sources("query").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= MAX_BACKOFF * 2, "slept {elapsed:?}");
        assert!(elapsed < MAX_BACKOFF * 3, "slept {elapsed:?}");
    }

    #[tokio::test]
    async fn unreachable_search_api_degrades_to_empty() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let endpoint = format!(
            "http://127.0.0.1:{}/v7.0/search",
            listener.local_addr().expect("local addr").port()
        );
        drop(listener);
        let config = Config::from_sources(crate::config::FileConfig::default(), move |key| {
            match key {
                "BING_API_KEY" => Some("bing-key".into()),
                "BING_SEARCH_URL" => Some(endpoint.clone()),
                "SEARCH_RETRY_LIMIT" => Some("2".into()),
                "SEARCH_RETRY_BACKOFF_MS" => Some("0".into()),
                _ => None,
            }
        })
        .expect("config");

        let finder = SourceFinder::from_config(&config).expect("finder");
        assert!(finder.find_sources("query").await.is_empty());
    }

    #[tokio::test]
    async fn disabled_finder_returns_nothing() {
        assert!(SourceFinder::disabled().find_sources("query").await.is_empty());
    }
}
