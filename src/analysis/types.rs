//! Request/response shapes and error definitions for the analysis pipeline.

use crate::search::SourceLink;
use crate::summarization::SummarizationError;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors emitted while handling a single analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Request body was missing, not JSON, or not a JSON object.
    #[error("Invalid or missing JSON body")]
    InvalidBody,
    /// Content was absent or blank after preprocessing.
    #[error("No content provided")]
    MissingContent,
    /// Language-model call failed; fatal to the request.
    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizationError),
}

/// Caller input for `POST /analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Raw text to analyze, not yet preprocessed.
    pub content: String,
    /// Caller metadata echoed back untouched.
    pub metadata: Map<String, Value>,
}

impl AnalysisRequest {
    /// Parse a raw request body.
    ///
    /// Only a body that is not a JSON object is rejected. A missing or non-string `content`
    /// becomes an empty string (rejected later as [`AnalysisError::MissingContent`]); a missing
    /// or non-object `metadata` becomes an empty object.
    pub fn from_json(body: &[u8]) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| AnalysisError::InvalidBody)?;
        let Value::Object(mut fields) = value else {
            return Err(AnalysisError::InvalidBody);
        };

        let content = match fields.remove("content") {
            Some(Value::String(content)) => content,
            _ => String::new(),
        };
        let metadata = match fields.remove("metadata") {
            Some(Value::Object(metadata)) => metadata,
            _ => Map::new(),
        };

        Ok(Self { content, metadata })
    }
}

/// Combined summary and related links returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Text produced by the summarizer.
    pub summary: String,
    /// Metadata copied from the request.
    pub metadata: Map<String, Value>,
    /// Related links found with the summary as query; empty when search failed.
    pub alternative_sources: Vec<SourceLink>,
}
