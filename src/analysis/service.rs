//! Analysis service coordinating preprocessing, summarization, and source lookup.

use crate::{
    analysis::{
        preprocess::preprocess_text,
        types::{AnalysisError, AnalysisRequest, AnalysisResult},
    },
    config::Config,
    search::SourceFinder,
    summarization::{OpenAiSummarizationClient, SummarizationClient},
};
use async_trait::async_trait;

/// Runs the summarize-then-search pipeline for one request at a time.
///
/// The service owns long-lived HTTP clients for both vendor APIs and holds no per-request
/// state, so a single instance is shared across requests through an `Arc`.
pub struct AnalysisService {
    summarizer: Box<dyn SummarizationClient>,
    source_finder: SourceFinder,
}

/// Abstraction over the analysis pipeline used by the HTTP surface.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Summarize the request content and attach related sources.
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

impl AnalysisService {
    /// Build the service with vendor clients derived from configuration.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        tracing::info!("Initializing summarization and search clients");
        let summarizer = OpenAiSummarizationClient::new(config)?;
        let source_finder = SourceFinder::from_config(config)?;
        Ok(Self::new(Box::new(summarizer), source_finder))
    }

    /// Assemble the service from already-built components.
    pub fn new(summarizer: Box<dyn SummarizationClient>, source_finder: SourceFinder) -> Self {
        Self {
            summarizer,
            source_finder,
        }
    }
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let AnalysisRequest { content, metadata } = request;
        let text = preprocess_text(&content);
        if text.is_empty() {
            return Err(AnalysisError::MissingContent);
        }

        tracing::debug!(bytes = text.len(), "Summarizing content");
        let summary = self.summarizer.summarize(&text).await?;

        // Search failures are absorbed by the finder; an empty list is a valid outcome.
        let alternative_sources = self.source_finder.find_sources(&summary).await;

        tracing::info!(
            summary_bytes = summary.len(),
            sources = alternative_sources.len(),
            metadata_keys = metadata.len(),
            "Analysis completed"
        );
        Ok(AnalysisResult {
            summary,
            metadata,
            alternative_sources,
        })
    }
}
