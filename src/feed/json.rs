//! JSON Feed 1.1 encoding (<https://jsonfeed.org/version/1.1>).

use super::EncodeError;
use crate::model::Feed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

/// Wire shape of a JSON Feed document.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonFeed {
    pub version: String,
    pub title: String,
    pub home_page_url: String,
    pub description: String,
    pub items: Vec<JsonFeedItem>,
    #[serde(rename = "_blogfeed")]
    pub extension: BlogfeedExtension,
}

/// Feed-level fields JSON Feed has no slot for, carried in an extension
/// object (extension keys start with `_` and are ignored by readers).
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BlogfeedExtension {
    pub created: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonFeedItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub content_text: String,
    pub date_published: DateTime<Utc>,
}

impl From<&Feed> for JsonFeed {
    fn from(feed: &Feed) -> Self {
        Self {
            version: JSON_FEED_VERSION.to_string(),
            title: feed.title.clone(),
            home_page_url: feed.link.clone(),
            description: feed.description.clone(),
            items: feed
                .entries
                .iter()
                .map(|e| JsonFeedItem {
                    id: e.link.clone(),
                    url: e.link.clone(),
                    title: e.title.clone(),
                    summary: e.description.clone(),
                    content_text: e.description.clone(),
                    date_published: e.created,
                })
                .collect(),
            extension: BlogfeedExtension {
                created: feed.created,
            },
        }
    }
}

/// Encodes `feed` as a pretty-printed JSON Feed document.
pub fn to_json_feed(feed: &Feed) -> Result<String, EncodeError> {
    Ok(serde_json::to_string_pretty(&JsonFeed::from(feed))?)
}
