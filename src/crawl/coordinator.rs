use super::extractor::{CardExtractor, EntryExtractor};
use super::fetcher::{FetchError, Fetcher};
use super::pagination::PaginationResolver;
use super::page::{scrape_page, PageOutcome};
use crate::config::Config;
use crate::feed::{assemble, EncodeError, FeedWriter, PersistError, WriteError, WrittenFeed};
use crate::model::{CrawlResult, SourceConfig};
use anyhow::Context;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

/// Failures scoped to a single source. None of them affect sibling sources;
/// [`SourceError::Persist`] additionally ends the whole run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The first listing page could not be fetched, so the page count is unknown.
    #[error("error getting last page: {0}")]
    Pagination(#[source] FetchError),
    /// Listing pages failed and `fail_on_page_error` is set.
    #[error("failed to fetch listing pages {pages:?}")]
    PageFetch { pages: Vec<u32> },
    #[error("error generating feed '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: EncodeError,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<WriteError> for SourceError {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::Encode { name, source } => SourceError::Encode { name, source },
            WriteError::Persist(e) => SourceError::Persist(e),
        }
    }
}

/// What one successful source run produced.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    pub pages: u32,
    pub failed_pages: Vec<u32>,
    pub entries: usize,
    pub tags: BTreeSet<String>,
    pub feeds: Vec<WrittenFeed>,
}

/// Crawls one source end to end: pagination, concurrent page scraping,
/// assembly, and writing.
pub struct CrawlCoordinator {
    fetcher: Fetcher,
    resolver: PaginationResolver,
    extractor: Arc<dyn EntryExtractor>,
    writer: FeedWriter,
    fail_on_page_error: bool,
}

impl CrawlCoordinator {
    /// Builds a coordinator using the card-list extractor for `config.site_origin`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let extractor = CardExtractor::new(&config.site_origin)?;
        Self::with_extractor(config, Arc::new(extractor))
    }

    /// Builds a coordinator around a custom extraction strategy.
    pub fn with_extractor(
        config: &Config,
        extractor: Arc<dyn EntryExtractor>,
    ) -> anyhow::Result<Self> {
        let fetcher =
            Fetcher::new(&config.fetch_settings()).context("Failed to create HTTP client")?;
        Ok(Self {
            fetcher,
            resolver: PaginationResolver::new()?,
            extractor,
            writer: FeedWriter::new(&config.output),
            fail_on_page_error: config.fail_on_page_error,
        })
    }

    /// Crawls, assembles, and writes every feed for `source`.
    ///
    /// Feeds are written primary first, then one per tag filter; the first
    /// write failure stops the remaining writes for this source.
    pub async fn run(&self, source: &SourceConfig) -> Result<SourceReport, SourceError> {
        let result = self.crawl(source).await?;
        let CrawlResult {
            entries,
            tags,
            pages_requested,
            failed_pages,
        } = result;
        let entry_count = entries.len();

        let mut feeds = Vec::with_capacity(1 + source.tag_filters.len());
        for assembled in assemble(source, entries, Utc::now()) {
            feeds.push(self.writer.write(&assembled)?);
        }

        tracing::info!(
            source = %source.name,
            pages = pages_requested,
            failed_pages = failed_pages.len(),
            entries = entry_count,
            tags = tags.len(),
            feeds = feeds.len(),
            "Source complete"
        );

        Ok(SourceReport {
            name: source.name.clone(),
            pages: pages_requested,
            failed_pages,
            entries: entry_count,
            tags,
            feeds,
        })
    }

    /// Resolves the page count, scrapes every page concurrently, and merges
    /// the per-page buffers once all page tasks have finished.
    pub async fn crawl(&self, source: &SourceConfig) -> Result<CrawlResult, SourceError> {
        let last_page = self
            .resolver
            .resolve(&self.fetcher, &source.url)
            .await
            .map_err(SourceError::Pagination)?;

        tracing::info!(source = %source.name, pages = last_page, "Crawling listing pages");

        let mut tasks = JoinSet::new();
        for page in 1..=last_page {
            let fetcher = self.fetcher.clone();
            let extractor = Arc::clone(&self.extractor);
            let url = source.page_url(page);
            tasks.spawn(async move {
                let outcome = scrape_page(&fetcher, extractor.as_ref(), &url, page).await;
                (page, url, outcome)
            });
        }

        let mut outcomes: Vec<PageOutcome> = Vec::with_capacity(last_page as usize);
        let mut reported = BTreeSet::new();
        let mut failed_pages = Vec::new();
        let mut skipped_cards = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page, _, Ok(outcome))) => {
                    reported.insert(page);
                    skipped_cards += outcome.skipped;
                    outcomes.push(outcome);
                }
                Ok((page, url, Err(e))) => {
                    reported.insert(page);
                    tracing::warn!(
                        source = %source.name,
                        page = page,
                        url = %url,
                        error = %e,
                        "Error visiting page"
                    );
                    failed_pages.push(page);
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, error = %e, "Page task failed");
                }
            }
        }

        // Tasks that panicked never reported their page number.
        failed_pages.extend((1..=last_page).filter(|p| !reported.contains(p)));
        failed_pages.sort_unstable();

        if skipped_cards > 0 {
            tracing::warn!(
                source = %source.name,
                skipped = skipped_cards,
                "Cards skipped due to unparsable fields"
            );
        }

        if self.fail_on_page_error && !failed_pages.is_empty() {
            return Err(SourceError::PageFetch {
                pages: failed_pages,
            });
        }

        Ok(merge_pages(outcomes, last_page, failed_pages))
    }
}

/// Concatenates page buffers in page order, so the merge is deterministic
/// regardless of which task finished first.
fn merge_pages(
    mut outcomes: Vec<PageOutcome>,
    pages_requested: u32,
    failed_pages: Vec<u32>,
) -> CrawlResult {
    outcomes.sort_by_key(|o| o.page);

    let mut result = CrawlResult {
        pages_requested,
        failed_pages,
        ..CrawlResult::default()
    };
    for outcome in outcomes {
        result.entries.extend(outcome.entries);
        result.tags.extend(outcome.tags);
    }
    result
}
