use super::extractor::EntryExtractor;
use super::fetcher::{FetchError, Fetcher};
use crate::model::BlogEntry;
use scraper::Html;
use std::collections::BTreeSet;

/// Entries and tags collected from one listing page. Tags include those of
/// skipped cards.
///
/// Each page task owns its own buffer; the coordinator merges them after the
/// page barrier.
#[derive(Debug, Default)]
pub struct PageOutcome {
    pub page: u32,
    pub entries: Vec<BlogEntry>,
    pub tags: BTreeSet<String>,
    /// Cards dropped because a field could not be parsed.
    pub skipped: usize,
}

/// Fetches and parses one listing page.
///
/// Card-level problems are logged by the extractor and counted in
/// [`PageOutcome::skipped`]; only the fetch itself can fail.
pub async fn scrape_page(
    fetcher: &Fetcher,
    extractor: &dyn EntryExtractor,
    url: &str,
    page: u32,
) -> Result<PageOutcome, FetchError> {
    let html = fetcher.fetch_html(url).await?;
    Ok(parse_page(extractor, &html, page))
}

/// Kept synchronous so the non-`Send` document never lives across an await.
fn parse_page(extractor: &dyn EntryExtractor, html: &str, page: u32) -> PageOutcome {
    let document = Html::parse_document(html);
    let extraction = extractor.extract(&document);

    tracing::debug!(
        page = page,
        entries = extraction.entries.len(),
        skipped = extraction.skipped.len(),
        "Scraped listing page"
    );

    PageOutcome {
        page,
        skipped: extraction.skipped.len(),
        entries: extraction.entries,
        tags: extraction.tags,
    }
}
