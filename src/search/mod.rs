//! Web search integration used to surface alternative sources.

pub mod client;
pub mod finder;
pub mod types;

pub use client::{BingSearchClient, SearchClient};
pub use finder::{SourceFinder, dedupe_by_url};
pub use types::{SearchError, SourceLink};
