//! Wire types and errors for the web search integration.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Related link returned to API consumers. `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    /// Page title, when the search API provided one.
    pub title: Option<String>,
    /// Absolute URL of the page.
    pub url: String,
    /// Short excerpt, when the search API provided one.
    pub snippet: Option<String>,
}

/// Errors raised by a single search call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Request never produced an HTTP response (connect failure, timeout, body read error).
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Search API answered with a non-success status.
    #[error("Search API returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the search API.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Response body was not the expected JSON shape.
    #[error("Malformed search response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    /// Whether the failure happened at the HTTP transport level and is worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedStatus { .. })
    }
}

/// Top-level Bing Web Search v7 response. Only the web page hits are read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BingResponse {
    #[serde(rename = "webPages", default)]
    pub(crate) web_pages: Option<BingWebPages>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BingWebPages {
    #[serde(default)]
    pub(crate) value: Vec<BingWebPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BingWebPage {
    pub(crate) name: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) snippet: Option<String>,
}

impl BingResponse {
    /// Convert hits into links, skipping hits that carry no URL.
    pub(crate) fn into_links(self) -> Vec<SourceLink> {
        self.web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|page| {
                let url = page.url.filter(|url| !url.trim().is_empty())?;
                Some(SourceLink {
                    title: page.name,
                    url,
                    snippet: page.snippet,
                })
            })
            .collect()
    }
}
