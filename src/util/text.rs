use std::borrow::Cow;

/// Typographic characters the remote markup uses that feed readers render poorly.
const REPLACEMENTS: [(char, char); 2] = [('\u{2019}', '\''), ('\u{2013}', '-')];

/// Normalizes scraped text: trims surrounding whitespace and replaces curly
/// apostrophes and en dashes with their ASCII equivalents.
///
/// Returns `Cow::Borrowed` when nothing needed replacing.
///
/// # Examples
///
/// ```
/// use blogfeed::util::normalize_text;
///
/// assert_eq!(normalize_text("  It\u{2019}s 9\u{2013}5 "), "It's 9-5");
/// assert_eq!(normalize_text("plain"), "plain");
/// ```
pub fn normalize_text(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    if !trimmed.chars().any(|c| REPLACEMENTS.iter().any(|(from, _)| *from == c)) {
        return Cow::Borrowed(trimmed);
    }

    Cow::Owned(
        trimmed
            .chars()
            .map(|c| {
                REPLACEMENTS
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map_or(c, |(_, to)| *to)
            })
            .collect(),
    )
}

/// Lower-cases `s` and upper-cases its first character (`"TECHNOLOGY"` → `"Technology"`).
pub fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
