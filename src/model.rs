//! Conference entities
//!
//! All entities are built once and never mutated: a [`PaperStub`] from a
//! session listing plus the [`PaperDetails`] of its detail page become one
//! [`PaperRecord`].

use serde::{Deserialize, Serialize};

/// A named grouping of papers (track or time slot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Short code, e.g. "MOA"
    pub code: String,
    pub title: String,
    /// Absolute URL of the session listing page
    pub listing_url: String,
}

impl Session {
    /// Display name, also the base of the session directory names
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.title)
    }
}

/// One row of a session listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperStub {
    pub paper_id: String,
    /// May be empty when the listing row carries no title
    pub title: String,
    pub detail_url: String,
    pub session_code: String,
}

/// A date as found on a detail page
///
/// `value` holds an ISO `YYYY-MM-DD` string when the text could be parsed,
/// otherwise the raw text with `normalized == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDate {
    pub value: String,
    pub normalized: bool,
}

/// The variable fields a detail page contributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperDetails {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub institutions: Vec<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub doi: Option<String>,
    pub received_date: Option<PaperDate>,
    pub accepted_date: Option<PaperDate>,
}

impl PaperDetails {
    /// True when the page yielded nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The full metadata of one paper
///
/// Field order is the serialization order of every output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub paper_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub institutions: Vec<String>,
    /// Empty when the detail page has no abstract
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: Option<String>,
    pub doi: Option<String>,
    pub received_date: Option<PaperDate>,
    pub accepted_date: Option<PaperDate>,
    pub session_code: String,
}

impl PaperRecord {
    /// Merges a listing stub with its detail page
    ///
    /// The listing title wins; the detail title fills in when the listing had none.
    pub fn from_parts(stub: PaperStub, details: PaperDetails) -> Self {
        let title = if stub.title.is_empty() {
            details.title.unwrap_or_default()
        } else {
            stub.title
        };

        Self {
            paper_id: stub.paper_id,
            title,
            authors: details.authors,
            institutions: details.institutions,
            abstract_text: details.abstract_text.unwrap_or_default(),
            pdf_url: details.pdf_url,
            doi: details.doi,
            received_date: details.received_date,
            accepted_date: details.accepted_date,
            session_code: stub.session_code,
        }
    }
}

/// A processed session with the records it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedSession {
    pub session: Session,
    pub records: Vec<PaperRecord>,
}

impl HarvestedSession {
    /// Records ordered by paper id, the order of every output file
    pub fn sorted_records(&self) -> Vec<&PaperRecord> {
        sorted_by_id(&self.records)
    }
}

/// Records ordered by paper id
pub fn sorted_by_id(records: &[PaperRecord]) -> Vec<&PaperRecord> {
    let mut sorted: Vec<&PaperRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.paper_id.cmp(&b.paper_id));
    sorted
}
