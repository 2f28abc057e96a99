use crate::model::Session;
use crate::parser::{element_text, normalize_whitespace};
use crate::url::resolve_link;
use crate::ParseError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static CODE_AND_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9]{1,11})\s*[-–—:]\s*(.+)$").expect("valid regex")
});

static CODE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]{1,11}$").expect("valid regex"));

/// Parses the conference index page into its ordered sessions
///
/// Session links are anchors whose path contains a `session`/`sessions`
/// segment followed by at least one more segment. Code and title come from
/// the anchor text (`"MOA - Opening"`), from the surrounding row or list item
/// when the anchor only holds the code, or from the URL slug as a last resort.
///
/// A missing title defaults to the code. Duplicate codes keep the first
/// occurrence.
///
/// # Arguments
///
/// * `html` - The index page HTML
/// * `page_url` - URL of the index page, used to resolve relative links
///
/// # Returns
///
/// * `Ok(Vec<Session>)` - Sessions in page order
/// * `Err(ParseError)` - The page contains no recognizable session link
pub fn parse_session_list(html: &str, page_url: &Url) -> Result<Vec<Session>, ParseError> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").map_err(|e| {
        ParseError::new(page_url.as_str(), format!("invalid selector: {:?}", e))
    })?;

    let mut sessions = Vec::new();
    let mut seen = HashSet::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(listing_url) = resolve_link(href, page_url) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&listing_url) else {
            continue;
        };
        let Some(slug) = session_slug(&parsed) else {
            continue;
        };

        let Some((code, title)) = code_and_title(anchor, &slug) else {
            continue;
        };

        if !seen.insert(code.clone()) {
            continue;
        }

        let title = if title.is_empty() { code.clone() } else { title };
        sessions.push(Session {
            code,
            title,
            listing_url,
        });
    }

    if sessions.is_empty() {
        return Err(ParseError::new(
            page_url.as_str(),
            "no session links found on index page",
        ));
    }

    Ok(sessions)
}

/// Returns the directory segment following `session`/`sessions`, if any
///
/// `session/1-moa/index.html` and `session/1-moa/` yield `1-moa`. A file
/// directly under the sessions directory (`session/index.html`, the usual
/// overview page) is not a session.
fn session_slug(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let position = segments
        .iter()
        .position(|s| s.eq_ignore_ascii_case("session") || s.eq_ignore_ascii_case("sessions"))?;
    let slug = segments.get(position + 1)?;
    let is_last = position + 2 >= segments.len();
    if is_last && slug.contains('.') && !url.path().ends_with('/') {
        return None;
    }
    Some(slug.to_string())
}

fn code_and_title(anchor: ElementRef<'_>, slug: &str) -> Option<(String, String)> {
    let text = element_text(anchor);

    if let Some(caps) = CODE_AND_TITLE.captures(&text) {
        return Some((caps[1].to_string(), normalize_whitespace(&caps[2])));
    }

    if CODE_ONLY.is_match(&text) {
        let title = title_near(anchor, &text)
            .or_else(|| anchor.value().attr("title").map(normalize_whitespace))
            .unwrap_or_default();
        return Some((text, title));
    }

    let code = code_from_slug(slug)?;
    let title = if text.is_empty() || text == code {
        String::new()
    } else {
        text
    };
    Some((code, title))
}

/// Title text from the table row or list item holding a code-only anchor
fn title_near(anchor: ElementRef<'_>, code: &str) -> Option<String> {
    let container = anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "tr" | "li"))?;

    let title = if container.value().name() == "tr" {
        let cell_selector = Selector::parse("td, th").ok()?;
        container
            .select(&cell_selector)
            .map(element_text)
            .filter(|cell| !cell.is_empty() && cell != code)
            .max_by_key(|cell| cell.len())?
    } else {
        let text = element_text(container);
        let rest = text.strip_prefix(code).unwrap_or(&text);
        rest.trim_start_matches(|c: char| c.is_whitespace() || "-–—:".contains(c))
            .to_string()
    };

    Some(title).filter(|t| !t.is_empty())
}

/// `1-moag` → `MOAG`, `moag` → `MOAG`
fn code_from_slug(slug: &str) -> Option<String> {
    let stem = slug.split('.').next().unwrap_or(slug);
    let candidate = stem.rsplit('-').next().unwrap_or(stem).to_ascii_uppercase();
    CODE_ONLY.is_match(&candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://conf.example.org/90/").unwrap()
    }

    #[test]
    fn test_code_and_title_in_anchor() {
        let html = r#"<html><body><ul>
            <li><a href="session/1-moa/index.html">MOA - Opening Session</a></li>
            <li><a href="session/2-mob/index.html">MOB: Beam Position Monitors</a></li>
        </ul></body></html>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].code, "MOA");
        assert_eq!(sessions[0].title, "Opening Session");
        assert_eq!(
            sessions[0].listing_url,
            "https://conf.example.org/90/session/1-moa/index.html"
        );
        assert_eq!(sessions[1].code, "MOB");
        assert_eq!(sessions[1].title, "Beam Position Monitors");
    }

    #[test]
    fn test_code_only_anchor_takes_title_from_row() {
        let html = r#"<table>
            <tr><td><a href="session/3-tua/index.html">TUA</a></td><td>Beam Loss Monitors</td></tr>
        </table>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions[0].code, "TUA");
        assert_eq!(sessions[0].title, "Beam Loss Monitors");
    }

    #[test]
    fn test_code_from_slug() {
        let html = r#"<a href="session/4-wepo/index.html">Poster Session</a>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions[0].code, "WEPO");
        assert_eq!(sessions[0].title, "Poster Session");
    }

    #[test]
    fn test_missing_title_defaults_to_code() {
        let html = r#"<a href="session/5-thb/index.html"></a>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions[0].code, "THB");
        assert_eq!(sessions[0].title, "THB");
    }

    #[test]
    fn test_duplicates_keep_first() {
        let html = r#"
            <a href="session/1-moa/index.html">MOA - First</a>
            <a href="session/1-moa/index.html#top">MOA - Second</a>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "First");
    }

    #[test]
    fn test_ignores_non_session_links() {
        let html = r#"
            <a href="authors/index.html">Authors</a>
            <a href="session/">Sessions</a>
            <a href="mailto:chair@example.org">Contact</a>
            <a href="session/1-moa/index.html">MOA - Opening</a>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].code, "MOA");
    }

    #[test]
    fn test_overview_page_link_is_not_a_session() {
        let html = r#"
            <nav><a href="session/index.html">Sessions</a></nav>
            <a href="session/1-moa/index.html">MOA - Opening</a>
            <a href="session/2-mob/">MOB - Beam Diagnostics</a>"#;

        let sessions = parse_session_list(html, &base()).unwrap();
        let codes: Vec<&str> = sessions.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["MOA", "MOB"]);
    }

    #[test]
    fn test_no_sessions_is_parse_error() {
        let html = "<html><body><p>Under construction</p></body></html>";
        let err = parse_session_list(html, &base()).unwrap_err();
        assert_eq!(err.url, "https://conf.example.org/90/");
    }
}
