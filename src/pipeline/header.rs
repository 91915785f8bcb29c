//! Read the record count a registry volume announces on its first page.
//!
//! The title block ends with a line like `Количество записей - 1234`. pdfium
//! may break that line anywhere, so all whitespace runs are collapsed to a
//! single space before matching. If the phrase occurs more than once the
//! last occurrence counts.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_ANNOUNCED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Количество записей - (\d+)").unwrap());

/// Announced number of records, or `None` if the page does not state one.
pub fn announced_count(page_text: &str) -> Option<usize> {
    let text = RE_WHITESPACE.replace_all(page_text, " ");
    RE_ANNOUNCED_COUNT
        .captures_iter(&text)
        .last()
        .and_then(|caps| caps[1].parse().ok())
}
