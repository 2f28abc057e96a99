/// Failure categories counted in the final report
///
/// This module defines every way a run can lose an item without aborting.
use std::fmt;

/// Categories of non-fatal failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    // ===== Run Level =====
    /// The index page was fetched but no session structure was found
    IndexParse,

    // ===== Session Level =====
    /// A session listing page could not be fetched
    SessionFetch,

    /// A session listing page had no recognizable paper table
    SessionParse,

    // ===== Paper Level =====
    /// A listing row with a paper ID but no detail link
    RowParse,

    /// A paper detail page could not be fetched
    DetailFetch,

    /// A paper detail page was fetched but carried no metadata at all
    DetailParse,

    /// A PDF download failed after retries or was rejected
    PdfDownload,

    // ===== Output =====
    /// A file or directory could not be written
    Filesystem,
}

impl FailureKind {
    /// Stable key used in reports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexParse => "index_parse",
            Self::SessionFetch => "session_fetch",
            Self::SessionParse => "session_parse",
            Self::RowParse => "row_parse",
            Self::DetailFetch => "detail_fetch",
            Self::DetailParse => "detail_parse",
            Self::PdfDownload => "pdf_download",
            Self::Filesystem => "filesystem",
        }
    }

    /// Returns all categories in report order
    pub fn all() -> Vec<Self> {
        vec![
            Self::IndexParse,
            Self::SessionFetch,
            Self::SessionParse,
            Self::RowParse,
            Self::DetailFetch,
            Self::DetailParse,
            Self::PdfDownload,
            Self::Filesystem,
        ]
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
