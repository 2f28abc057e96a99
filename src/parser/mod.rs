//! HTML parsers for the conference site
//!
//! Each parser is a pure function: page HTML plus the page URL in, typed
//! records out. They never fetch, log or touch the filesystem, so markup
//! drift on the source site stays a local, testable change.
//!
//! - [`parse_session_list`]: index page → ordered sessions
//! - [`parse_paper_list`]: session listing → ordered paper stubs
//! - [`parse_paper_detail`]: detail page → authors, institutions, abstract, PDF, DOI, dates

mod dates;
mod detail;
mod papers;
mod sessions;

pub use dates::parse_date_text;
pub use detail::parse_paper_detail;
pub use papers::{parse_paper_list, PaperListing};
pub use sessions::parse_session_list;

use scraper::ElementRef;

/// Collapses every whitespace run to one space and trims the ends
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Splits a delimited list, normalizing and de-duplicating entries
///
/// Order of first appearance is kept.
pub(crate) fn split_list(text: &str, delimiters: &[char], split_and: bool) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for part in text.split(|c| delimiters.contains(&c)) {
        let pieces: Vec<&str> = if split_and {
            part.split(" and ").collect()
        } else {
            vec![part]
        };

        for piece in pieces {
            let item = normalize_whitespace(piece);
            // footnote markers
            let item = item.trim_matches(|c: char| c == '*' || c == '†' || c == '‡');
            let item = item.trim();
            if !item.is_empty() && !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }

    items
}

/// Pushes `value` unless an equal entry already exists
pub(crate) fn push_unique(items: &mut Vec<String>, value: String) {
    if !value.is_empty() && !items.contains(&value) {
        items.push(value);
    }
}
