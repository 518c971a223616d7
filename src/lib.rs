//! Crawls a paginated blog listing and publishes RSS and JSON Feed files,
//! plus sub-feeds filtered by tag, for each configured blog section.

pub mod config;
pub mod crawl;
pub mod feed;
pub mod model;
pub mod orchestrator;
pub mod util;

pub use config::Config;
pub use orchestrator::{Orchestrator, RunError, RunSummary};
