use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for the harvester
///
/// Every section has defaults, so an empty TOML document (or no file at all)
/// yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Explicit session table; bypasses index discovery when non-empty
    #[serde(rename = "session")]
    pub sessions: Vec<SessionEntry>,
}

/// Where the conference lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the conference website
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the session index page, relative to the base URL
    #[serde(rename = "index-path")]
    pub index_path: String,

    /// PDF location template used when a detail page has no PDF link
    #[serde(rename = "pdf-fallback-path")]
    pub pdf_fallback_path: Option<String>,

    /// DOI template used when a detail page has no DOI
    #[serde(rename = "doi-template")]
    pub doi_template: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://meow.elettra.eu/90/".to_string(),
            index_path: String::new(),
            pdf_fallback_path: None,
            doi_template: None,
        }
    }
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Lower bound of the pause before every request (seconds)
    #[serde(rename = "delay-min-secs")]
    pub delay_min_secs: f64,

    /// Upper bound of the pause before every request (seconds)
    #[serde(rename = "delay-max-secs")]
    pub delay_max_secs: f64,

    /// Total attempts per URL
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Base of the exponential backoff between attempts (seconds)
    #[serde(rename = "backoff-base-secs")]
    pub backoff_base_secs: f64,

    /// Downloads smaller than this are rejected as broken PDFs
    #[serde(rename = "min-pdf-bytes")]
    pub min_pdf_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_min_secs: 1.0,
            delay_max_secs: 2.0,
            max_retries: 3,
            request_timeout_secs: 30,
            backoff_base_secs: 1.0,
            min_pdf_bytes: 100,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ConferenceHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/conference-harvester".to_string(),
            contact_email: "harvester@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for everything the run writes
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Prefix of the run-level files; defaults to the output directory name
    #[serde(rename = "file-prefix")]
    pub file_prefix: Option<String>,

    /// Save every fetched listing and detail page under Debug/
    #[serde(rename = "capture-pages")]
    pub capture_pages: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("IBIC2025_Data"),
            file_prefix: None,
            capture_pages: false,
        }
    }
}

impl OutputConfig {
    /// Prefix used for `<prefix>_Complete_Index.json` and friends
    pub fn resolved_prefix(&self) -> String {
        if let Some(prefix) = self.file_prefix.as_deref().filter(|p| !p.is_empty()) {
            return prefix.to_string();
        }
        prefix_from_dir(&self.output_dir)
    }
}

fn prefix_from_dir(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("Harvest")
        .to_string()
}

/// One entry of the explicit session table
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEntry {
    /// Session code (e.g. "MOA")
    pub code: String,

    /// Descriptive title; defaults to the code
    #[serde(default)]
    pub title: Option<String>,

    /// Listing page URL, absolute or relative to the base URL
    pub url: String,
}
