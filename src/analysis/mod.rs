//! Analysis pipeline: validate, preprocess, summarize, then look up related sources.

pub mod preprocess;
mod service;
pub mod types;

pub use preprocess::preprocess_text;
pub use service::{AnalysisApi, AnalysisService};
pub use types::{AnalysisError, AnalysisRequest, AnalysisResult};
