//! Conference Harvester: a polite conference proceedings scraper
//!
//! This crate walks a static conference website (session index, session
//! listings, paper detail pages), extracts paper metadata, downloads the
//! paper PDFs and persists everything as per-session JSON/CSV/TXT files plus
//! a master index and a final report.

pub mod config;
pub mod crawler;
pub mod download;
pub mod model;
pub mod output;
pub mod parser;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Cannot enumerate sessions, index fetch failed: {0}")]
    IndexUnavailable(FetchError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Why a fetch gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request timed out
    Timeout,
    /// Connection refused, DNS failure, TLS failure
    Connect,
    /// The server answered with a non-success status
    Status(u16),
    /// The response body could not be read
    Body(String),
    /// Any other request failure
    Request(String),
}

impl FetchErrorKind {
    /// Returns true if the same request may succeed when repeated
    ///
    /// Timeouts, connection problems, truncated bodies, 5xx and 429 are
    /// transient; every other status is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect | Self::Body(_) => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Request(_) => false,
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Body(msg) => write!(f, "failed to read body: {}", msg),
            Self::Request(msg) => write!(f, "{}", msg),
        }
    }
}

/// A fetch that failed after exhausting its attempts
#[derive(Debug, Clone, Error)]
#[error("Fetch failed for {url} after {attempts} attempt(s): {kind}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    pub kind: FetchErrorKind,
}

/// The page markup did not contain the structure a parser relies on
#[derive(Debug, Clone, Error)]
#[error("HTML parse error for {url}: {message}")]
pub struct ParseError {
    pub url: String,
    pub message: String,
}

impl ParseError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while writing output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Index file {} is missing", .0.display())]
    MissingIndex(PathBuf),
}

impl OutputError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, RunOptions};
pub use model::{PaperRecord, PaperStub, Session};
pub use state::{FailureKind, PdfOutcome};
