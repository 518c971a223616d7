use crate::model::{AssembledFeed, BlogEntry, Feed, FeedEntry, SourceConfig, SourceIdentity};
use crate::util::capitalize;
use chrono::{DateTime, Utc};

/// Sorts newest first. Stable, so same-day entries keep their merge order.
pub fn sort_entries(entries: &mut [BlogEntry]) {
    entries.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
}

/// Entries with at least one tag containing `filter`, in their original order.
pub fn filter_by_tag(entries: &[BlogEntry], filter: &str) -> Vec<BlogEntry> {
    entries
        .iter()
        .filter(|e| e.matches_tag(filter))
        .cloned()
        .collect()
}

/// Output name of a sub-feed: `{source}_{filter}` lower-cased.
pub fn sub_feed_name(source: &str, filter: &str) -> String {
    format!("{}_{}", source, filter).to_lowercase()
}

/// Builds the feed for an already-sorted entry list.
pub fn build_feed(
    identity: &SourceIdentity,
    title: String,
    entries: &[BlogEntry],
    created: DateTime<Utc>,
) -> Feed {
    Feed {
        title,
        link: identity.link.clone(),
        description: identity.description.clone(),
        created,
        entries: entries.iter().map(FeedEntry::from).collect(),
    }
}

/// Builds the primary feed followed by one sub-feed per tag filter.
///
/// `created` stamps every feed; callers pass `Utc::now()`.
pub fn assemble(
    source: &SourceConfig,
    mut entries: Vec<BlogEntry>,
    created: DateTime<Utc>,
) -> Vec<AssembledFeed> {
    sort_entries(&mut entries);

    let identity = &source.identity;
    let mut feeds = Vec::with_capacity(1 + source.tag_filters.len());

    for filter in &source.tag_filters {
        let mut subset = filter_by_tag(&entries, filter);
        sort_entries(&mut subset);
        let title = format!("{} - {}", identity.title, capitalize(filter));
        tracing::debug!(
            source = %source.name,
            filter = %filter,
            entries = subset.len(),
            "Assembled sub-feed"
        );
        feeds.push(AssembledFeed {
            name: sub_feed_name(&source.name, filter),
            feed: build_feed(identity, title, &subset, created),
            entries: subset,
        });
    }

    let primary = AssembledFeed {
        name: source.name.to_lowercase(),
        feed: build_feed(identity, identity.title.clone(), &entries, created),
        entries,
    };
    feeds.insert(0, primary);
    feeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn entry(title: &str, day: u32, tags: &[&str]) -> BlogEntry {
        BlogEntry {
            pub_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: format!("About {}", title),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            title: title.to_string(),
            link: format!("https://monzo.com/blog/{}", title.to_lowercase()),
        }
    }

    fn source(filters: &[&str]) -> SourceConfig {
        SourceConfig {
            name: "blog".to_string(),
            url: "https://monzo.com/blog".to_string(),
            identity: SourceIdentity {
                title: "Monzo".to_string(),
                link: "https://monzo.com/blog".to_string(),
                description: "An unofficial Monzo blog feed".to_string(),
            },
            tag_filters: filters.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn created() -> DateTime<Utc> {
        "2024-02-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_technology_sub_feed_contains_only_matching_entries() {
        let entries = vec![
            entry("A", 2, &["Technology", "Culture"]),
            entry("B", 3, &["Culture"]),
        ];
        let feeds = assemble(&source(&["Technology"]), entries, created());

        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].name, "blog");
        assert_eq!(feeds[0].feed.title, "Monzo");
        let primary: Vec<_> = feeds[0].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(primary, vec!["B", "A"]);

        assert_eq!(feeds[1].name, "blog_technology");
        assert_eq!(feeds[1].feed.title, "Monzo - Technology");
        let sub: Vec<_> = feeds[1].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(sub, vec!["A"]);
        assert_eq!(feeds[1].feed.entries.len(), 1);
    }

    #[test]
    fn test_feed_uses_explicit_identity_and_timestamp() {
        let feeds = assemble(&source(&[]), vec![entry("A", 1, &[])], created());
        let feed = &feeds[0].feed;
        assert_eq!(feed.link, "https://monzo.com/blog");
        assert_eq!(feed.description, "An unofficial Monzo blog feed");
        assert_eq!(feed.created, created());
        assert_eq!(
            feed.entries[0],
            FeedEntry {
                title: "A".to_string(),
                link: "https://monzo.com/blog/a".to_string(),
                description: "About A".to_string(),
                created: "2024-01-01T00:00:00Z".parse().unwrap(),
            }
        );
    }

    #[test]
    fn test_empty_source_still_produces_feeds() {
        let feeds = assemble(&source(&["Technology"]), Vec::new(), created());
        assert_eq!(feeds.len(), 2);
        assert!(feeds.iter().all(|f| f.entries.is_empty() && f.feed.entries.is_empty()));
    }

    #[test]
    fn test_filter_matching_is_substring_and_case_sensitive() {
        let entries = vec![
            entry("A", 1, &["Technology"]),
            entry("B", 1, &["FinTech"]),
            entry("C", 1, &["technology"]),
        ];
        let titles = |filter: &str| -> Vec<String> {
            filter_by_tag(&entries, filter)
                .into_iter()
                .map(|e| e.title)
                .collect()
        };
        assert_eq!(titles("Tech"), vec!["A", "B"]);
        assert_eq!(titles("technology"), vec!["C"]);
    }

    #[test]
    fn test_sort_is_stable_for_same_day() {
        let mut entries = vec![
            entry("First", 5, &[]),
            entry("Newer", 9, &[]),
            entry("Second", 5, &[]),
        ];
        sort_entries(&mut entries);
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "First", "Second"]);
    }

    #[test]
    fn test_sub_feed_name_is_lower_cased() {
        assert_eq!(sub_feed_name("Blog", "Open Banking"), "blog_open banking");
        assert_eq!(sub_feed_name("us_blog", "Technology"), "us_blog_technology");
    }

    fn arb_entries() -> impl Strategy<Value = Vec<BlogEntry>> {
        prop::collection::vec(
            (
                1u32..=28,
                prop::collection::vec(
                    prop::sample::select(vec!["Technology", "Culture", "Money", "FinTech"]),
                    0..3,
                ),
            ),
            0..40,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (day, tags))| entry(&format!("E{}", i), day, &tags))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_assembled_entries_are_newest_first(entries in arb_entries()) {
            let feeds = assemble(&source(&["Tech", "Culture"]), entries, created());
            for feed in &feeds {
                for pair in feed.entries.windows(2) {
                    prop_assert!(pair[0].pub_date >= pair[1].pub_date);
                }
                prop_assert_eq!(feed.entries.len(), feed.feed.entries.len());
            }
        }

        #[test]
        fn prop_sub_feed_is_order_preserving_subset(entries in arb_entries()) {
            let feeds = assemble(&source(&["Tech"]), entries, created());
            let expected: Vec<&BlogEntry> = feeds[0]
                .entries
                .iter()
                .filter(|e| e.tags.iter().any(|t| t.contains("Tech")))
                .collect();
            let actual: Vec<&BlogEntry> = feeds[1].entries.iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
