//! Crawler module for fetching and walking the conference site
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - Request pacing and retry policies
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod policy;

pub use coordinator::{Harvester, RunContext, RunOptions, RunSummary};
pub use fetcher::{build_http_client, Fetcher};
pub use policy::{RequestThrottle, RetryPolicy};

use crate::config::Config;

/// Runs a complete harvest
///
/// This is the main entry point for starting a run. It will:
/// 1. Build the HTTP client and output layout
/// 2. Enumerate the sessions
/// 3. Fetch listings, detail pages and PDFs
/// 4. Write session files, master index, global CSV and final report
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `options` - Run switches (session limit, PDF skipping, config hash)
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed, possibly with per-item failures
/// * `Err(HarvestError)` - The run could not enumerate any session
pub async fn harvest(config: Config, options: RunOptions) -> crate::Result<RunSummary> {
    Harvester::new(config, options)?.run().await
}
