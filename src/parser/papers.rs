use crate::model::PaperStub;
use crate::parser::element_text;
use crate::url::resolve_link;
use crate::ParseError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static PAPER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,}[A-Z0-9]*\d+$").expect("valid regex"));

/// The stubs found on one session listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperListing {
    /// Paper stubs in listing order, unique by paper id
    pub stubs: Vec<PaperStub>,
    /// Rows that looked like papers but lacked an id or a detail link
    pub skipped_rows: usize,
}

/// Parses a session listing page into paper stubs
///
/// Works over the table rows of the page. For each row the paper id is the
/// first token that starts with the session code (taken from cell text or
/// link targets), falling back to an id-shaped first cell. The detail URL is
/// the row's first non-PDF link, preferring one that mentions the id.
///
/// Rows without a paper id (headers, spacers, navigation) are ignored. Rows
/// with an id but no detail link are counted in `skipped_rows`. A repeated id
/// keeps its first row.
///
/// # Errors
///
/// Returns `ParseError` when the page has no table rows with data cells.
pub fn parse_paper_list(
    html: &str,
    page_url: &Url,
    session_code: &str,
) -> Result<PaperListing, ParseError> {
    let document = Html::parse_document(html);
    let row_selector = selector("tr", page_url)?;
    let cell_selector = selector("td", page_url)?;
    let anchor_selector = selector("a[href]", page_url)?;

    let rows: Vec<ElementRef<'_>> = document
        .select(&row_selector)
        .filter(|row| row.select(&cell_selector).next().is_some())
        .collect();

    if rows.is_empty() {
        return Err(ParseError::new(
            page_url.as_str(),
            "no paper table rows found on session listing",
        ));
    }

    let mut listing = PaperListing::default();
    let mut seen = HashSet::new();

    for row in rows {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        let links: Vec<(String, String)> = row
            .select(&anchor_selector)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let url = resolve_link(href, page_url)?;
                Some((url, element_text(a)))
            })
            .collect();

        // Rows without an id-shaped token are layout or navigation
        let Some(paper_id) = find_paper_id(&cells, &links, session_code) else {
            continue;
        };
        let Some((detail_url, link_text)) =
            detail_link(&links, &paper_id).or_else(|| detail_link(&links, ""))
        else {
            listing.skipped_rows += 1;
            continue;
        };

        if !seen.insert(paper_id.clone()) {
            continue;
        }

        let title = row_title(&cells, &link_text, &paper_id);
        listing.stubs.push(PaperStub {
            paper_id,
            title,
            detail_url,
            session_code: session_code.to_string(),
        });
    }

    Ok(listing)
}

fn selector(css: &str, page_url: &Url) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| {
        ParseError::new(
            page_url.as_str(),
            format!("invalid selector {}: {:?}", css, e),
        )
    })
}

fn find_paper_id(
    cells: &[ElementRef<'_>],
    links: &[(String, String)],
    session_code: &str,
) -> Option<String> {
    let code = session_code.to_ascii_uppercase();

    let from_cells = cells
        .iter()
        .flat_map(|cell| {
            element_text(*cell)
                .split_whitespace()
                .map(clean_token)
                .collect::<Vec<_>>()
        })
        .find(|token| is_session_id(token, &code));
    if from_cells.is_some() {
        return from_cells;
    }

    let from_links = links
        .iter()
        .filter_map(|(url, _)| link_stem(url))
        .map(|stem| stem.to_ascii_uppercase())
        .find(|token| is_session_id(token, &code));
    if from_links.is_some() {
        return from_links;
    }

    cells
        .first()
        .map(|cell| clean_token(&element_text(*cell)))
        .filter(|token| PAPER_ID.is_match(token))
}

fn is_session_id(token: &str, code: &str) -> bool {
    !code.is_empty()
        && token.starts_with(code)
        && token.len() > code.len()
        && PAPER_ID.is_match(token)
}

fn clean_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// File stem of the last path segment, e.g. `MOA01` for `.../MOA01.html`
fn link_stem(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = last.split('.').next().unwrap_or(last);
    Some(stem.to_string())
}

fn is_pdf_link(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

/// First non-PDF link mentioning `paper_id` (any non-PDF link when empty)
fn detail_link(links: &[(String, String)], paper_id: &str) -> Option<(String, String)> {
    let needle = paper_id.to_ascii_lowercase();
    links
        .iter()
        .filter(|(url, _)| !is_pdf_link(url))
        .find(|(url, _)| needle.is_empty() || url.to_ascii_lowercase().contains(&needle))
        .cloned()
}

fn row_title(cells: &[ElementRef<'_>], link_text: &str, paper_id: &str) -> String {
    let titled = cells.iter().find(|cell| {
        cell.value()
            .attr("class")
            .map(|class| class.to_ascii_lowercase().contains("title"))
            .unwrap_or(false)
    });

    let raw = if let Some(cell) = titled {
        element_text(*cell)
    } else if !link_text.is_empty() && !strip_id(link_text, paper_id).is_empty() {
        link_text.to_string()
    } else {
        cells
            .iter()
            .map(|cell| element_text(*cell))
            .filter(|text| !strip_id(text, paper_id).is_empty())
            .max_by_key(|text| text.len())
            .unwrap_or_default()
    };

    strip_id(&raw, paper_id).to_string()
}

fn strip_id<'a>(text: &'a str, paper_id: &str) -> &'a str {
    text.strip_prefix(paper_id)
        .unwrap_or(text)
        .trim_start_matches(|c: char| c.is_whitespace() || "-–—:".contains(c))
        .trim()
}
