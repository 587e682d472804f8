use crate::Locale;

/// Parse an all-locales file body into an ordered, deduplicated
/// locale list.
///
/// The format is line-oriented: one locale code per line, optionally
/// followed by whitespace-separated qualifiers (platform filters in
/// shipped-locales files), with `#` starting a comment.
#[must_use]
pub fn parse_locales(body: &str) -> Vec<Locale> {
    let mut seen = Vec::new();
    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default();
        let Some(code) = line.split_whitespace().next() else {
            continue;
        };
        let locale = Locale::from(code);
        if !seen.contains(&locale) {
            seen.push(locale);
        }
    }
    seen
}
