use crate::model::{PaperDate, PaperDetails};
use crate::parser::{element_text, normalize_whitespace, parse_date_text, push_unique, split_list};
use crate::url::resolve_link;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"10\.\d{4,9}/[^\s"<>]+"#).expect("valid regex"));

static DATE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(received|revised|accepted|issue date|published)\s*:")
        .expect("valid regex")
});

static ABSTRACT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^abstract\s*:?\s*").expect("valid regex"));

/// Extracts the variable fields of a paper from its detail page
///
/// Every field is looked up on its own, so a page without an abstract still
/// yields authors, PDF link and the rest. Highwire `citation_*` meta tags are
/// preferred when present, then common class names and labels.
///
/// This never fails: missing markup just leaves fields empty.
pub fn parse_paper_detail(html: &str, page_url: &Url) -> PaperDetails {
    let document = Html::parse_document(html);
    let meta = citation_meta(&document);

    PaperDetails {
        title: extract_title(&document, &meta),
        authors: extract_authors(&document, &meta),
        institutions: extract_institutions(&document, &meta),
        abstract_text: extract_abstract(&document, &meta),
        pdf_url: extract_pdf_url(&document, &meta, page_url),
        doi: extract_doi(&document, &meta),
        received_date: find_date(&document, "received"),
        accepted_date: find_date(&document, "accepted"),
    }
}

/// `(lowercased name, content)` of every named meta tag, in page order
fn citation_meta(document: &Html) -> Vec<(String, String)> {
    let Ok(selector) = Selector::parse("meta[name][content]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let name = el.value().attr("name")?.trim().to_ascii_lowercase();
            let content = normalize_whitespace(el.value().attr("content")?);
            (!content.is_empty()).then_some((name, content))
        })
        .collect()
}

fn meta_values<'a>(meta: &'a [(String, String)], name: &'a str) -> impl Iterator<Item = &'a str> {
    meta.iter()
        .filter(move |(n, _)| n == name)
        .map(|(_, content)| content.as_str())
}

fn first_meta(meta: &[(String, String)], name: &str) -> Option<String> {
    meta_values(meta, name).next().map(str::to_string)
}

/// Text of the first element matching `css` that has any
fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn all_texts(document: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn extract_title(document: &Html, meta: &[(String, String)]) -> Option<String> {
    first_meta(meta, "citation_title")
        .or_else(|| first_text(document, "h1"))
        .or_else(|| first_text(document, ".title, .paper-title"))
        .or_else(|| first_text(document, "title"))
}

fn extract_authors(document: &Html, meta: &[(String, String)]) -> Vec<String> {
    let mut authors = Vec::new();
    for name in meta_values(meta, "citation_author") {
        push_unique(&mut authors, name.to_string());
    }
    if !authors.is_empty() {
        return authors;
    }

    let items = all_texts(document, ".authors li, .author-list li");
    let texts = if items.is_empty() {
        all_texts(document, ".author, .authors")
    } else {
        items
    };

    for text in texts {
        for name in split_list(&text, &[',', ';'], true) {
            push_unique(&mut authors, name);
        }
    }
    authors
}

fn extract_institutions(document: &Html, meta: &[(String, String)]) -> Vec<String> {
    let mut institutions = Vec::new();
    for name in meta_values(meta, "citation_author_institution") {
        push_unique(&mut institutions, name.to_string());
    }
    if !institutions.is_empty() {
        return institutions;
    }

    let items = all_texts(
        document,
        ".affiliation li, .affiliations li, .institution li, .institutions li",
    );
    let texts = if items.is_empty() {
        all_texts(
            document,
            ".affiliation, .affiliations, .institution, .institutions",
        )
    } else {
        items
    };

    for text in texts {
        for name in split_list(&text, &[';'], false) {
            push_unique(&mut institutions, name);
        }
    }
    institutions
}

fn extract_abstract(document: &Html, meta: &[(String, String)]) -> Option<String> {
    if let Some(text) = first_meta(meta, "citation_abstract") {
        return Some(strip_abstract_label(&text)).filter(|t| !t.is_empty());
    }

    if let Some(text) = first_text(document, ".abstract, #abstract") {
        let text = strip_abstract_label(&text);
        if !text.is_empty() {
            return Some(text);
        }
    }

    abstract_after_label(document)
}

fn strip_abstract_label(text: &str) -> String {
    ABSTRACT_LABEL.replace(text, "").trim().to_string()
}

/// Abstract introduced by an "Abstract" heading or bold label
fn abstract_after_label(document: &Html) -> Option<String> {
    let selector = Selector::parse("h2, h3, h4, h5, strong, b, dt").ok()?;

    for label in document.select(&selector) {
        let text = element_text(label);
        if !text.trim_end_matches(':').eq_ignore_ascii_case("abstract") {
            continue;
        }

        let is_heading = matches!(label.value().name(), "h2" | "h3" | "h4" | "h5" | "dt");
        let found = if is_heading {
            label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .map(element_text)
        } else {
            label
                .parent()
                .and_then(ElementRef::wrap)
                .map(|parent| strip_abstract_label(&element_text(parent)))
        };

        if let Some(found) = found.filter(|t| !t.is_empty()) {
            return Some(found);
        }
    }

    None
}

fn extract_pdf_url(
    document: &Html,
    meta: &[(String, String)],
    page_url: &Url,
) -> Option<String> {
    let from_meta =
        first_meta(meta, "citation_pdf_url").and_then(|href| resolve_link(&href, page_url));
    if from_meta.is_some() {
        return from_meta;
    }

    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|a| resolve_link(a.value().attr("href")?, page_url))
        .find(|url| {
            Url::parse(url)
                .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
                .unwrap_or(false)
        })
}

fn extract_doi(document: &Html, meta: &[(String, String)]) -> Option<String> {
    if let Some(doi) = first_meta(meta, "citation_doi").and_then(|raw| normalize_doi(&raw)) {
        return Some(doi);
    }

    if let Ok(selector) = Selector::parse(r#"a[href*="doi.org"]"#) {
        let linked = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .find_map(normalize_doi);
        if linked.is_some() {
            return linked;
        }
    }

    let body = first_text(document, "body")?;
    normalize_doi(&body)
}

/// Canonical `https://doi.org/10.x/...` form of the first DOI in `raw`
fn normalize_doi(raw: &str) -> Option<String> {
    let found = DOI.find(raw)?.as_str();
    let doi = found.trim_end_matches(['.', ',', ';', ')', ']']);
    Some(format!("https://doi.org/{}", doi))
}

/// Text nodes of the body, whitespace-normalized, empty ones dropped
fn text_lines(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("body") else {
        return Vec::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return Vec::new();
    };
    body.text()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Value of the `<label>:` date on the page
///
/// The value is the text after the label up to the next date label on the
/// same line, or the following line when the label stands alone.
fn find_date(document: &Html, label: &str) -> Option<PaperDate> {
    let lines = text_lines(document);

    for (index, line) in lines.iter().enumerate() {
        let labels: Vec<_> = DATE_LABEL.captures_iter(line).collect();

        for (position, caps) in labels.iter().enumerate() {
            if !caps[1].eq_ignore_ascii_case(label) {
                continue;
            }
            let Some(whole) = caps.get(0) else {
                continue;
            };

            let end = labels
                .get(position + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(line.len());
            let value = line[whole.end()..end].trim();

            if !value.is_empty() {
                return parse_date_text(value);
            }
            if let Some(next) = lines.get(index + 1) {
                if !DATE_LABEL.is_match(next) {
                    return parse_date_text(next);
                }
            }
        }
    }

    None
}
