//! Core data types shared by the crawl, assembly, and output layers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;

/// One post summary scraped from a listing page.
///
/// Serialized field names match the published record dump format
/// (`PubDate`, `Description`, `Tags`, `Title`, `Link`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlogEntry {
    #[serde(serialize_with = "serialize_midnight_utc")]
    pub pub_date: NaiveDate,
    pub description: String,
    pub tags: Vec<String>,
    pub title: String,
    pub link: String,
}

impl BlogEntry {
    /// Publish date as a timestamp at midnight UTC.
    pub fn published_at(&self) -> DateTime<Utc> {
        midnight_utc(self.pub_date)
    }

    /// True if any tag contains `filter` as a case-sensitive substring.
    pub fn matches_tag(&self, filter: &str) -> bool {
        self.tags.iter().any(|tag| tag.contains(filter))
    }
}

pub(crate) fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn serialize_midnight_utc<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(
        &midnight_utc(*date).to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    )
}

/// Title, canonical link, and description a source's feeds are published under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceIdentity {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// One independently crawled blog section.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base for output file names (`blog` → `blog.rss`, `blog_technology.rss`).
    pub name: String,
    /// Listing URL; page `n` lives at `{url}/page/{n}`.
    pub url: String,
    #[serde(flatten)]
    pub identity: SourceIdentity,
    /// Tag filters to derive sub-feeds for.
    #[serde(default)]
    pub tag_filters: Vec<String>,
}

impl SourceConfig {
    /// URL of the `page`-th listing page (1-based).
    pub fn page_url(&self, page: u32) -> String {
        format!("{}/page/{}", self.url.trim_end_matches('/'), page)
    }
}

/// Everything collected for one source after the page barrier.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Unordered; ordering is restored by the assembler.
    pub entries: Vec<BlogEntry>,
    /// Distinct tags observed across all cards.
    pub tags: BTreeSet<String>,
    pub pages_requested: u32,
    pub failed_pages: Vec<u32>,
}

/// A syndication feed ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

impl From<&BlogEntry> for FeedEntry {
    fn from(entry: &BlogEntry) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            description: entry.description.clone(),
            created: entry.published_at(),
        }
    }
}

/// A feed plus the sorted entries it was built from, under its output name.
#[derive(Debug, Clone)]
pub struct AssembledFeed {
    /// Output base name, e.g. `blog` or `blog_technology`.
    pub name: String,
    pub entries: Vec<BlogEntry>,
    pub feed: Feed,
}
