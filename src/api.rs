//! HTTP surface for contentlens.
//!
//! A single endpoint is exposed:
//!
//! - `POST /analyze` – Summarize `content` with the language model, search the web using the
//!   summary, and return `{ "summary", "metadata", "alternative_sources" }`. `metadata` is echoed
//!   back unchanged (or `{}` when absent or not an object).
//!
//! Client mistakes map to `400 {"error": ...}`. Every internal failure, including a panic inside
//! a handler, maps to `500` with a generic message; details only reach the server logs.

use crate::analysis::{AnalysisApi, AnalysisError, AnalysisRequest, AnalysisResult};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

const INVALID_BODY_MESSAGE: &str = "Invalid or missing JSON body";
const MISSING_CONTENT_MESSAGE: &str = "No content provided";
const INTERNAL_ERROR_MESSAGE: &str = "Failed to analyze content";

/// Build the HTTP router exposing the analysis endpoint.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AnalysisApi + 'static,
{
    Router::new()
        .route("/analyze", post(analyze_content::<S>))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Analyze caller content.
///
/// The body is read as raw bytes so that a missing or malformed JSON body produces the API's own
/// error shape instead of the extractor's rejection.
async fn analyze_content<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<AnalysisResult>, ApiError>
where
    S: AnalysisApi,
{
    let request = AnalysisRequest::from_json(&body)?;
    let result = service.analyze(request).await?;
    Ok(Json(result))
}

#[derive(Debug)]
enum ApiError {
    InvalidBody,
    MissingContent,
    Internal,
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidBody => Self::InvalidBody,
            AnalysisError::MissingContent => Self::MissingContent,
            AnalysisError::Summarization(source) => {
                tracing::error!(error = %source, "Summarization failed; rejecting request");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidBody => (StatusCode::BAD_REQUEST, INVALID_BODY_MESSAGE),
            Self::MissingContent => (StatusCode::BAD_REQUEST, MISSING_CONTENT_MESSAGE),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "Request handler panicked");
    ApiError::Internal.into_response()
}
