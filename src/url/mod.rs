//! URL handling module
//!
//! This module provides base URL normalization, link resolution for the
//! parsers and `{paper_id}` template expansion.

mod normalize;

use ::url::Url;

// Re-export main functions
pub use normalize::{normalize_base_url, strip_fragment};

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use conference_harvester::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://conf.example.org/90/session/1-moa/index.html").unwrap();
/// assert_eq!(
///     resolve_link("../../pdf/MOA01.pdf", &base).as_deref(),
///     Some("https://conf.example.org/90/pdf/MOA01.pdf")
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                strip_fragment(&mut absolute_url);
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Expands a `{paper_id}` template
///
/// Relative results are resolved against `base_url`; templates that already
/// are absolute URLs (e.g. `https://doi.org/...`) are returned as expanded.
pub fn expand_template(template: &str, paper_id: &str, base_url: &Url) -> Option<String> {
    let expanded = template.replace("{paper_id}", paper_id);
    if Url::parse(&expanded).is_ok() {
        return Some(expanded);
    }
    resolve_link(&expanded, base_url)
}
