//! Extraction strategies that turn a parsed listing page into blog entries.
//!
//! The crawl pipeline only depends on [`EntryExtractor`]; [`CardExtractor`]
//! knows the remote site's class-name conventions.

use crate::model::BlogEntry;
use crate::util::normalize_text;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Literal date format printed on cards, e.g. `2 January 2024`.
pub const CARD_DATE_FORMAT: &str = "%d %B %Y";

/// Parses a card date in exactly [`CARD_DATE_FORMAT`].
///
/// chrono also accepts abbreviated month names and missing separators, so the
/// parsed date is rendered back and compared with the input. The day may be
/// written with or without a leading zero, the month in any case, and fields
/// may be separated by more than one space.
pub fn parse_card_date(text: &str) -> Result<NaiveDate, ExtractError> {
    let invalid = |reason: String| ExtractError::InvalidDate {
        text: text.to_string(),
        reason,
    };
    let date =
        NaiveDate::parse_from_str(text, CARD_DATE_FORMAT).map_err(|e| invalid(e.to_string()))?;

    let canonical = [
        date.format("%-d %B %Y").to_string(),
        date.format(CARD_DATE_FORMAT).to_string(),
    ];
    let spaced = text
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if canonical.iter().any(|c| c.eq_ignore_ascii_case(&spaced)) {
        Ok(date)
    } else {
        Err(invalid(format!("expected a date like '{}'", canonical[0])))
    }
}

/// Why a single card was skipped. Never fails the page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("card has no body element")]
    MissingCard,
    #[error("card has no link")]
    MissingLink,
    #[error("invalid link '{href}': {reason}")]
    InvalidLink { href: String, reason: String },
    #[error("invalid date '{text}': {reason}")]
    InvalidDate { text: String, reason: String },
}

/// Entries found on one page, plus the cards that had to be skipped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub entries: Vec<BlogEntry>,
    pub skipped: Vec<ExtractError>,
    /// Tags seen on every card body, including cards later skipped.
    pub tags: BTreeSet<String>,
}

/// Extracts entries from a parsed listing page.
///
/// `Html` is not `Send`, so implementations run synchronously between the
/// fetch and the hand-off back to the coordinator.
pub trait EntryExtractor: Send + Sync {
    fn extract(&self, document: &Html) -> Extraction;
}

struct CardSelectors {
    list: Selector,
    anchor: Selector,
    card: Selector,
    title: Selector,
    tags: Selector,
    description: Selector,
    date: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{}`: {}", css, e))
}

/// Extractor for the card list layout: `CardList_CardList` containers holding
/// one `<a>` per post, each wrapping a `Card_card` body.
pub struct CardExtractor {
    origin: Url,
    selectors: CardSelectors,
}

impl CardExtractor {
    /// `origin` is the site root that relative card links are resolved against.
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| anyhow!("invalid site origin `{}`: {}", origin, e))?;
        Ok(Self {
            origin,
            selectors: CardSelectors {
                list: selector("div[class*='CardList_CardList']")?,
                anchor: selector("a")?,
                card: selector("div[class*='Card_card']")?,
                title: selector("div[class*='Card_titleContainer']")?,
                tags: selector(
                    "div[class*='Card_tagContainer'] div[class*='TagList_tagList'] div[class*='TagList_tagWrapper']",
                )?,
                description: selector("div[class*='Card_descriptionContainer']")?,
                date: selector("div[class*='Card_dateContainer']")?,
            },
        })
    }

    /// Tags are recorded into `observed` before any field can fail.
    fn extract_card(
        &self,
        anchor: ElementRef<'_>,
        observed: &mut BTreeSet<String>,
    ) -> Result<BlogEntry, ExtractError> {
        let s = &self.selectors;
        let card = anchor.select(&s.card).next().ok_or(ExtractError::MissingCard)?;

        let title = normalize_text(&text_of(card, &s.title)).into_owned();
        let description = normalize_text(&text_of(card, &s.description)).into_owned();
        let tags: Vec<String> = card
            .select(&s.tags)
            .map(|t| t.text().collect::<String>())
            .collect();
        observed.extend(tags.iter().cloned());

        let pub_date = parse_card_date(text_of(card, &s.date).trim())?;

        let href = anchor.value().attr("href").ok_or(ExtractError::MissingLink)?;
        let link = self
            .origin
            .join(href)
            .map_err(|e| ExtractError::InvalidLink {
                href: href.to_string(),
                reason: e.to_string(),
            })?
            .to_string();

        Ok(BlogEntry {
            pub_date,
            description,
            tags,
            title,
            link,
        })
    }
}

impl EntryExtractor for CardExtractor {
    fn extract(&self, document: &Html) -> Extraction {
        let mut extraction = Extraction::default();

        for list in document.select(&self.selectors.list) {
            for anchor in list.select(&self.selectors.anchor) {
                match self.extract_card(anchor, &mut extraction.tags) {
                    Ok(entry) => extraction.entries.push(entry),
                    Err(e) => {
                        tracing::warn!(
                            href = anchor.value().attr("href").unwrap_or(""),
                            error = %e,
                            "Skipping card"
                        );
                        extraction.skipped.push(e);
                    }
                }
            }
        }

        extraction
    }
}

/// Concatenated text of every element under `root` matching `selector`.
fn text_of(root: ElementRef<'_>, selector: &Selector) -> String {
    root.select(selector)
        .flat_map(|el| el.text())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Renders one card the way the listing markup nests it.
    pub(crate) fn card_html(title: &str, date: &str, tags: &[&str], href: &str) -> String {
        let tags: String = tags
            .iter()
            .map(|t| format!(r#"<div class="TagList_tagWrapper__x1">{}</div>"#, t))
            .collect();
        format!(
            r#"<a href="{href}">
  <div class="Card_card__a1b2">
    <div class="Card_titleContainer__z">{title}</div>
    <div class="Card_tagContainer__q"><div class="TagList_tagList__r">{tags}</div></div>
    <div class="Card_descriptionContainer__d">About {title}</div>
    <div class="Card_dateContainer__e"> {date} </div>
  </div>
</a>"#
        )
    }

    pub(crate) fn listing_html(cards: &[String], last_page_href: Option<&str>) -> String {
        let pagination = last_page_href
            .map(|href| {
                format!(
                    r#"<nav><a class="Pagination_LastPageLinkDesktop__k" href="{}">Last</a></nav>"#,
                    href
                )
            })
            .unwrap_or_default();
        format!(
            r#"<html><body><div class="CardList_CardList__abc">{}</div>{}</body></html>"#,
            cards.concat(),
            pagination
        )
    }

    fn extractor() -> CardExtractor {
        CardExtractor::new("https://monzo.com").unwrap()
    }

    #[test]
    fn test_extracts_all_card_fields() {
        let html = listing_html(
            &[card_html(
                "We\u{2019}re growing",
                "2 January 2024",
                &["Technology", "Culture"],
                "/blog/2024/01/02/growing",
            )],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));

        assert!(extraction.skipped.is_empty());
        assert_eq!(
            extraction.entries,
            vec![BlogEntry {
                pub_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                description: "About We're growing".to_string(),
                tags: vec!["Technology".to_string(), "Culture".to_string()],
                title: "We're growing".to_string(),
                link: "https://monzo.com/blog/2024/01/02/growing".to_string(),
            }]
        );
    }

    #[test]
    fn test_malformed_date_skips_only_that_card() {
        let html = listing_html(
            &[
                card_html("One", "1 March 2023", &[], "/blog/one"),
                card_html("Two", "March 2nd, 2023", &[], "/blog/two"),
                card_html("Three", "3 March 2023", &[], "/blog/three"),
            ],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));

        let titles: Vec<_> = extraction.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
        assert_eq!(extraction.skipped.len(), 1);
        assert!(matches!(
            &extraction.skipped[0],
            ExtractError::InvalidDate { text, .. } if text == "March 2nd, 2023"
        ));
    }

    #[test]
    fn test_card_date_accepts_only_the_long_form() {
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_card_date("2 January 2024"), Ok(jan2));
        assert_eq!(parse_card_date("02 January 2024"), Ok(jan2));
        assert_eq!(parse_card_date("2 january 2024"), Ok(jan2));
        assert_eq!(parse_card_date("2  January 2024"), Ok(jan2));
        assert_eq!(
            parse_card_date("12 September 2023"),
            Ok(NaiveDate::from_ymd_opt(2023, 9, 12).unwrap())
        );

        for text in ["2 Jan 2024", "2January2024", "2 Sept 2023", "2 January 24"] {
            assert!(
                matches!(parse_card_date(text), Err(ExtractError::InvalidDate { .. })),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_abbreviated_and_squashed_dates_skip_their_cards() {
        let html = listing_html(
            &[
                card_html("Abbrev", "2 Jan 2024", &[], "/blog/abbrev"),
                card_html("NoSpaces", "2January2024", &[], "/blog/nospaces"),
                card_html("Lower", "2 january 2024", &[], "/blog/lower"),
            ],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));

        let titles: Vec<_> = extraction.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Lower"]);
        assert_eq!(extraction.skipped.len(), 2);
    }

    #[test]
    fn test_tags_of_skipped_cards_are_still_observed() {
        let html = listing_html(
            &[
                card_html("Kept", "1 March 2023", &["Culture"], "/blog/kept"),
                card_html("Dropped", "soon", &["Technology"], "/blog/dropped"),
            ],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));

        assert_eq!(extraction.entries.len(), 1);
        assert_eq!(
            extraction.tags.into_iter().collect::<Vec<_>>(),
            vec!["Culture".to_string(), "Technology".to_string()]
        );
    }

    #[test]
    fn test_page_without_card_list_yields_nothing() {
        let html = "<html><body><p>No posts here</p></body></html>";
        let extraction = extractor().extract(&Html::parse_document(html));
        assert!(extraction.entries.is_empty());
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_anchor_without_card_body_is_skipped() {
        let html = listing_html(
            &[
                r#"<a href="/blog/archive">See all</a>"#.to_string(),
                card_html("Kept", "9 May 2022", &[], "/blog/kept"),
            ],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));
        assert_eq!(extraction.entries.len(), 1);
        assert_eq!(extraction.skipped, vec![ExtractError::MissingCard]);
    }

    #[test]
    fn test_absolute_href_is_kept() {
        let html = listing_html(
            &[card_html("Abs", "9 May 2022", &[], "https://monzo.com/us/blog/abs")],
            None,
        );
        let extraction = extractor().extract(&Html::parse_document(&html));
        assert_eq!(extraction.entries[0].link, "https://monzo.com/us/blog/abs");
    }

    #[test]
    fn test_invalid_origin_rejected() {
        assert!(CardExtractor::new("not a url").is_err());
    }
}
