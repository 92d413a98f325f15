#![deny(missing_docs)]

//! Core library for the contentlens analysis server.

/// Request pipeline: preprocessing, orchestration, and request/response types.
pub mod analysis;
/// HTTP routing and the `/analyze` handler.
pub mod api;
/// File- and environment-driven configuration.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Web search client and related-source lookup.
pub mod search;
/// Language-model summarization client.
pub mod summarization;
