use crate::model::PaperDate;
use crate::parser::normalize_whitespace;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Longest raw date text kept when parsing fails
const MAX_RAW_LEN: usize = 64;

const FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
];

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex"));

static ABBREVIATION_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]{3,})\.").expect("valid regex"));

static EMBEDDED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2}\s+[A-Za-z]+\s+\d{4}|[A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}[./]\d{1,2}[./]\d{4})",
    )
    .expect("valid regex")
});

/// Normalizes a textual date to ISO `YYYY-MM-DD`
///
/// Accepts the usual proceedings spellings ("10 September 2025",
/// "10 Sep. 2025", "September 10, 2025", "2025-09-10", "10.09.2025"),
/// also when surrounded by other text. Text that cannot be parsed is kept
/// verbatim (capped) with `normalized == false`. Empty input yields `None`.
///
/// # Examples
///
/// ```
/// use conference_harvester::parser::parse_date_text;
///
/// let date = parse_date_text("10 September 2025").unwrap();
/// assert_eq!(date.value, "2025-09-10");
/// assert!(date.normalized);
///
/// let raw = parse_date_text("to be announced").unwrap();
/// assert_eq!(raw.value, "to be announced");
/// assert!(!raw.normalized);
/// ```
pub fn parse_date_text(raw: &str) -> Option<PaperDate> {
    let text = normalize_whitespace(raw);
    let text = text.trim_end_matches(['.', ',', ';']).trim();
    if text.is_empty() {
        return None;
    }

    let cleaned = ORDINAL.replace_all(text, "$1");
    let cleaned = ABBREVIATION_DOT.replace_all(&cleaned, "$1");

    if let Some(date) = try_formats(&cleaned) {
        return Some(iso(date));
    }

    if let Some(found) = EMBEDDED_DATE.find(&cleaned) {
        if let Some(date) = try_formats(found.as_str()) {
            return Some(iso(date));
        }
    }

    Some(PaperDate {
        value: text.chars().take(MAX_RAW_LEN).collect(),
        normalized: false,
    })
}

fn try_formats(text: &str) -> Option<NaiveDate> {
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn iso(date: NaiveDate) -> PaperDate {
    PaperDate {
        value: date.format("%Y-%m-%d").to_string(),
        normalized: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(raw: &str) -> String {
        let date = parse_date_text(raw).unwrap();
        assert!(date.normalized, "{:?} was not normalized", raw);
        date.value
    }

    #[test]
    fn test_day_month_year() {
        assert_eq!(normalized("10 September 2025"), "2025-09-10");
        assert_eq!(normalized("1 Oct 2025"), "2025-10-01");
    }

    #[test]
    fn test_abbreviation_with_dot() {
        assert_eq!(normalized("10 Sep. 2025"), "2025-09-10");
    }

    #[test]
    fn test_month_first() {
        assert_eq!(normalized("September 10, 2025"), "2025-09-10");
        assert_eq!(normalized("September 3rd, 2025"), "2025-09-03");
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(normalized("2025-09-10"), "2025-09-10");
        assert_eq!(normalized("10.09.2025"), "2025-09-10");
    }

    #[test]
    fn test_embedded_date() {
        assert_eq!(normalized("10 September 2025 (final)"), "2025-09-10");
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(normalized("10 September 2025."), "2025-09-10");
    }

    #[test]
    fn test_unparseable_kept_raw() {
        let date = parse_date_text("sometime in autumn").unwrap();
        assert_eq!(date.value, "sometime in autumn");
        assert!(!date.normalized);
    }

    #[test]
    fn test_invalid_calendar_date_kept_raw() {
        let date = parse_date_text("31 February 2025").unwrap();
        assert!(!date.normalized);
        assert_eq!(date.value, "31 February 2025");
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(parse_date_text("   "), None);
    }

    #[test]
    fn test_raw_is_capped() {
        let long = "x".repeat(200);
        let date = parse_date_text(&long).unwrap();
        assert_eq!(date.value.len(), MAX_RAW_LEN);
    }
}
