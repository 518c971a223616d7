use super::fetcher::{FetchError, Fetcher};
use anyhow::{anyhow, Result};
use scraper::{Html, Selector};

const LAST_PAGE_SELECTOR: &str = "a[class*='Pagination_LastPageLinkDesktop']";

/// Determines how many listing pages a source has.
pub struct PaginationResolver {
    last_page_link: Selector,
}

impl PaginationResolver {
    pub fn new() -> Result<Self> {
        let last_page_link = Selector::parse(LAST_PAGE_SELECTOR)
            .map_err(|e| anyhow!("invalid selector `{}`: {}", LAST_PAGE_SELECTOR, e))?;
        Ok(Self { last_page_link })
    }

    /// Fetches the first listing page at `base_url` and returns the page count.
    ///
    /// A listing without a last-page link is a single page. Only the fetch can
    /// fail; a malformed link falls back to one page.
    pub async fn resolve(&self, fetcher: &Fetcher, base_url: &str) -> Result<u32, FetchError> {
        let html = fetcher.fetch_html(base_url).await?;
        let document = Html::parse_document(&html);
        Ok(self.last_page(&document, base_url))
    }

    fn last_page(&self, document: &Html, base_url: &str) -> u32 {
        let Some(href) = document
            .select(&self.last_page_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())
        else {
            tracing::debug!(url = %base_url, "No last-page link, treating listing as one page");
            return 1;
        };

        let segment = href.rsplit('/').next().unwrap_or_default();
        match segment.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            Ok(_) => {
                tracing::warn!(url = %base_url, href = %href, "Last-page link points at page 0, using 1");
                1
            }
            Err(e) => {
                tracing::warn!(
                    url = %base_url,
                    href = %href,
                    error = %e,
                    "Malformed last-page link, using 1"
                );
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchSettings;
    use crate::crawl::extractor::tests::listing_html;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver() -> PaginationResolver {
        PaginationResolver::new().unwrap()
    }

    fn last_page_of(html: &str) -> u32 {
        resolver().last_page(&Html::parse_document(html), "https://monzo.com/blog")
    }

    #[test]
    fn test_reads_trailing_segment() {
        assert_eq!(last_page_of(&listing_html(&[], Some("/blog/page/42"))), 42);
    }

    #[test]
    fn test_missing_link_means_single_page() {
        assert_eq!(last_page_of(&listing_html(&[], None)), 1);
    }

    #[test]
    fn test_malformed_segment_falls_back_to_one() {
        assert_eq!(last_page_of(&listing_html(&[], Some("/blog/page/last"))), 1);
        assert_eq!(last_page_of(&listing_html(&[], Some("/blog/page/"))), 1);
        assert_eq!(last_page_of(&listing_html(&[], Some("/blog/page/0"))), 1);
    }

    #[test]
    fn test_empty_href_means_single_page() {
        assert_eq!(last_page_of(&listing_html(&[], Some(""))), 1);
    }

    #[tokio::test]
    async fn test_resolve_fetches_first_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_html(&[], Some("/blog/page/7"))),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&FetchSettings::default()).unwrap();
        let pages = resolver()
            .resolve(&fetcher, &format!("{}/blog", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(pages, 7);
    }

    #[tokio::test]
    async fn test_resolve_propagates_fetch_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&FetchSettings::default()).unwrap();
        let result = resolver()
            .resolve(&fetcher, &format!("{}/blog", mock_server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::HttpStatus(404))));
    }
}
