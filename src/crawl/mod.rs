//! Listing crawl: fetching, pagination, extraction, and per-source coordination.
//!
//! - [`fetcher`] - HTTP transport with retry and size limits
//! - [`pagination`] - Discovers how many listing pages a source has
//! - [`extractor`] - Turns a parsed page into [`BlogEntry`](crate::model::BlogEntry) values
//! - [`page`] - Fetches and extracts one listing page
//! - [`coordinator`] - Runs one source end to end

pub mod coordinator;
pub mod extractor;
pub mod fetcher;
pub mod page;
pub mod pagination;

pub use coordinator::{CrawlCoordinator, SourceError, SourceReport};
pub use extractor::{CardExtractor, EntryExtractor, ExtractError, Extraction};
pub use fetcher::{FetchError, Fetcher};
pub use page::{scrape_page, PageOutcome};
pub use pagination::PaginationResolver;
