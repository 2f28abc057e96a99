use std::fmt;
use std::path::PathBuf;

/// What happened when a paper's PDF was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    /// Fetched and moved into place
    Downloaded { path: PathBuf, bytes: u64 },

    /// A file was already present at the destination; nothing was fetched
    AlreadyExists { path: PathBuf },

    /// Fetch failed after retries, or the body was rejected
    DownloadFailed { cause: String },
}

impl PdfOutcome {
    /// Returns true if the PDF is on disk after this outcome
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Downloaded { .. } | Self::AlreadyExists { .. })
    }

    /// Stable key used in reports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded { .. } => "downloaded",
            Self::AlreadyExists { .. } => "already_exists",
            Self::DownloadFailed { .. } => "download_failed",
        }
    }
}

impl fmt::Display for PdfOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadFailed { cause } => write!(f, "{}: {}", self.as_str(), cause),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}
