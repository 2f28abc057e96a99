//! Harvest coordinator - main pipeline orchestration
//!
//! This module drives a run from the conference index down to the PDFs:
//! - Enumerating sessions (configured table or index page)
//! - Fetching and parsing each session listing and paper detail page
//! - Downloading PDFs
//! - Writing the per-session files, master index, global CSV and report
//!
//! Everything is awaited strictly in sequence. Only an unreachable index page
//! (or an output root that cannot be created) aborts a run; every other
//! failure is logged, counted and skipped.

use crate::config::Config;
use crate::crawler::Fetcher;
use crate::download::download_pdf;
use crate::model::{HarvestedSession, PaperRecord, PaperStub, Session};
use crate::output::{
    write_all_papers_csv, write_final_report, write_index, write_session_files, HarvestIndex,
    ReportInfo, RunStats, SessionStats,
};
use crate::parser::{parse_paper_detail, parse_paper_list, parse_session_list};
use crate::state::FailureKind;
use crate::storage::{OutputLayout, PdfNamer};
use crate::url::{expand_template, normalize_base_url, resolve_link};
use crate::{HarvestError, ParseError, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::Instrument;
use url::Url;

/// Per-run switches that are not part of the configuration file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Process only the first N sessions
    pub limit_sessions: Option<usize>,

    /// Collect metadata only, download no PDFs
    pub skip_pdfs: bool,

    /// SHA-256 of the config file, recorded in the report
    pub config_hash: Option<String>,
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStats,
    pub total_papers: usize,
    pub index_path: PathBuf,
    pub report_path: PathBuf,
}

/// Everything a run threads through its stages
///
/// Holds the configuration, the single fetcher (and with it the request
/// pacing), the output layout and the counters.
pub struct RunContext {
    pub config: Config,
    pub base_url: Url,
    pub fetcher: Fetcher,
    pub layout: OutputLayout,
    pub stats: RunStats,
}

impl RunContext {
    pub fn new(config: Config) -> Result<Self> {
        let base_url = normalize_base_url(&config.site.base_url)?;
        let fetcher = Fetcher::from_config(&config)?;
        let layout = OutputLayout::new(
            config.output.output_dir.clone(),
            config.output.resolved_prefix(),
        );

        Ok(Self {
            config,
            base_url,
            fetcher,
            layout,
            stats: RunStats::new(),
        })
    }

    /// Saves a page under Debug/; failures are only logged
    fn capture(&self, label: &str, html: &str) {
        match self.layout.save_debug_capture(label, html) {
            Ok(path) => tracing::debug!("Saved page capture {}", path.display()),
            Err(e) => tracing::warn!("Could not save page capture {}: {}", label, e),
        }
    }

    fn capture_pages(&self) -> bool {
        self.config.output.capture_pages
    }
}

/// Main harvest coordinator
pub struct Harvester {
    ctx: RunContext,
    options: RunOptions,
}

impl Harvester {
    /// Creates a harvester for one run
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `options` - Run switches
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Invalid base URL or HTTP client setup failed
    pub fn new(config: Config, options: RunOptions) -> Result<Self> {
        Ok(Self {
            ctx: RunContext::new(config)?,
            options,
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.ctx.layout
    }

    /// Runs the whole pipeline
    ///
    /// 1. Prepare the output tree
    /// 2. Enumerate sessions
    /// 3. Per session: listing → detail pages → PDFs → session files
    /// 4. Master index, global CSV and final report
    pub async fn run(mut self) -> Result<RunSummary> {
        let started_at = Local::now();
        let ctx = &mut self.ctx;
        tracing::info!(
            "Starting harvest of {} into {}",
            ctx.base_url,
            ctx.layout.root().display()
        );

        ctx.layout.prepare()?;

        let mut sessions = discover_sessions(ctx).await?;
        if let Some(limit) = self.options.limit_sessions {
            if sessions.len() > limit {
                tracing::info!(
                    "Limiting run to the first {} of {} sessions",
                    limit,
                    sessions.len()
                );
                sessions.truncate(limit);
            }
        }
        let total = sessions.len();
        tracing::info!("Processing {} sessions", total);

        let mut harvested = Vec::new();
        for (position, session) in sessions.into_iter().enumerate() {
            let span = tracing::info_span!("session", code = %session.code);
            tracing::info!(
                "[{}/{}] Session {}",
                position + 1,
                total,
                session.display_name()
            );

            if let Some(records) = harvest_session(ctx, &self.options, &session)
                .instrument(span)
                .await
            {
                harvested.push(HarvestedSession { session, records });
            }
        }

        ctx.stats.requests_sent = ctx.fetcher.requests_sent();
        let index = HarvestIndex::build(&harvested);

        if let Err(e) = write_index(&ctx.layout, &index) {
            tracing::error!("Failed to write master index: {}", e);
            ctx.stats.record_run_failure(FailureKind::Filesystem);
        }
        if let Err(e) = write_all_papers_csv(&ctx.layout, &harvested) {
            tracing::error!("Failed to write global CSV: {}", e);
            ctx.stats.record_run_failure(FailureKind::Filesystem);
        }

        let info = ReportInfo {
            base_url: ctx.base_url.to_string(),
            started_at,
            finished_at: Local::now(),
            config_hash: self.options.config_hash.clone(),
            pdfs_skipped: self.options.skip_pdfs,
        };
        if let Err(e) = write_final_report(&ctx.layout, &ctx.stats, &info) {
            tracing::error!("Failed to write final report: {}", e);
            ctx.stats.record_run_failure(FailureKind::Filesystem);
        }

        tracing::info!(
            "Harvest completed: {} sessions, {} papers, {} PDFs downloaded, {} failures, {} requests in {}s",
            ctx.stats.total_sessions(),
            index.total_papers,
            ctx.stats.pdfs_downloaded(),
            ctx.stats.total_failures(),
            ctx.stats.requests_sent,
            (info.finished_at - started_at).num_seconds()
        );

        Ok(RunSummary {
            total_papers: index.total_papers,
            index_path: ctx.layout.index_path(),
            report_path: ctx.layout.report_path(),
            stats: std::mem::take(&mut ctx.stats),
        })
    }
}

/// Enumerates the sessions of the run
///
/// A configured session table wins. Otherwise the index page is fetched and
/// parsed; failing to fetch it is the one fatal error of a run, while an
/// index without recognizable sessions yields an empty run.
async fn discover_sessions(ctx: &mut RunContext) -> Result<Vec<Session>> {
    if !ctx.config.sessions.is_empty() {
        tracing::info!(
            "Using {} sessions from configuration",
            ctx.config.sessions.len()
        );
        return Ok(configured_sessions(ctx));
    }

    let index_url = if ctx.config.site.index_path.trim().is_empty() {
        ctx.base_url.clone()
    } else {
        ctx.base_url.join(ctx.config.site.index_path.trim())?
    };

    let html = match ctx.fetcher.fetch_text(index_url.as_str()).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("Cannot fetch conference index {}: {}", index_url, e);
            return Err(HarvestError::IndexUnavailable(e));
        }
    };
    if ctx.capture_pages() {
        ctx.capture("index", &html);
    }

    match parse_session_list(&html, &index_url) {
        Ok(sessions) => Ok(sessions),
        Err(e) => {
            tracing::warn!("{}", e);
            ctx.capture("index_parse_failure", &html);
            ctx.stats.record_run_failure(FailureKind::IndexParse);
            Ok(Vec::new())
        }
    }
}

fn configured_sessions(ctx: &RunContext) -> Vec<Session> {
    ctx.config
        .sessions
        .iter()
        .filter_map(|entry| {
            let Some(listing_url) = resolve_link(&entry.url, &ctx.base_url) else {
                tracing::warn!(
                    "Skipping configured session {}: unusable URL {:?}",
                    entry.code,
                    entry.url
                );
                return None;
            };
            let title = entry
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| entry.code.clone());
            Some(Session {
                code: entry.code.clone(),
                title,
                listing_url,
            })
        })
        .collect()
}

/// Processes one session; `None` when its listing could not be used
async fn harvest_session(
    ctx: &mut RunContext,
    options: &RunOptions,
    session: &Session,
) -> Option<Vec<PaperRecord>> {
    let mut stats = SessionStats::new(session);
    let records = harvest_session_papers(ctx, options, session, &mut stats).await;

    if let Some(records) = &records {
        stats.papers_recorded = records.len() as u64;
        match write_session_files(&ctx.layout, session, records) {
            Ok(dir) => tracing::info!("Wrote {} papers to {}", records.len(), dir.display()),
            Err(e) => {
                tracing::error!("Failed to write session files: {}", e);
                stats.record_failure(FailureKind::Filesystem);
            }
        }
    }

    ctx.stats.sessions.push(stats);
    records
}

async fn harvest_session_papers(
    ctx: &mut RunContext,
    options: &RunOptions,
    session: &Session,
    stats: &mut SessionStats,
) -> Option<Vec<PaperRecord>> {
    if let Err(e) = ctx.layout.prepare_session(session) {
        tracing::error!("Cannot create session directories: {}", e);
        stats.record_failure(FailureKind::Filesystem);
        return None;
    }

    let html = match ctx.fetcher.fetch_text(&session.listing_url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Skipping session, listing unavailable: {}", e);
            stats.record_failure(FailureKind::SessionFetch);
            return None;
        }
    };
    if ctx.capture_pages() {
        ctx.capture(&format!("{}_listing", session.code), &html);
    }

    let listing = Url::parse(&session.listing_url)
        .map_err(|e| ParseError::new(session.listing_url.as_str(), e.to_string()))
        .and_then(|url| parse_paper_list(&html, &url, &session.code));
    let listing = match listing {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!("Skipping session: {}", e);
            ctx.capture(&format!("{}_listing_parse_failure", session.code), &html);
            stats.record_failure(FailureKind::SessionParse);
            return None;
        }
    };

    if listing.skipped_rows > 0 {
        tracing::warn!(
            "{} listing rows with a paper id but no detail link on {}",
            listing.skipped_rows,
            session.listing_url
        );
        stats.record_failures(FailureKind::RowParse, listing.skipped_rows as u64);
    }
    stats.papers_found = listing.stubs.len() as u64;
    tracing::info!("Found {} papers", listing.stubs.len());

    let mut namer = PdfNamer::new();
    let mut records = Vec::with_capacity(listing.stubs.len());
    for stub in listing.stubs {
        let span = tracing::info_span!("paper", id = %stub.paper_id);
        let record = harvest_paper(ctx, options, session, stub, stats, &mut namer)
            .instrument(span)
            .await;
        if let Some(record) = record {
            records.push(record);
        }
    }

    Some(records)
}

/// Fetches one detail page, builds the record and downloads its PDF
async fn harvest_paper(
    ctx: &mut RunContext,
    options: &RunOptions,
    session: &Session,
    stub: PaperStub,
    stats: &mut SessionStats,
    namer: &mut PdfNamer,
) -> Option<PaperRecord> {
    let html = match ctx.fetcher.fetch_text(&stub.detail_url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Skipping paper, detail page unavailable: {}", e);
            stats.record_failure(FailureKind::DetailFetch);
            return None;
        }
    };
    if ctx.capture_pages() {
        ctx.capture(&format!("{}_detail", stub.paper_id), &html);
    }

    let page_url = Url::parse(&stub.detail_url).unwrap_or_else(|_| ctx.base_url.clone());
    let mut details = parse_paper_detail(&html, &page_url);
    if details.is_empty() {
        tracing::warn!("No metadata found on {}", stub.detail_url);
        ctx.capture(&format!("{}_detail_parse_failure", stub.paper_id), &html);
        stats.record_failure(FailureKind::DetailParse);
    }

    if details.pdf_url.is_none() {
        details.pdf_url = ctx
            .config
            .site
            .pdf_fallback_path
            .as_deref()
            .and_then(|template| expand_template(template, &stub.paper_id, &ctx.base_url));
    }
    if details.doi.is_none() {
        details.doi = ctx
            .config
            .site
            .doi_template
            .as_deref()
            .and_then(|template| expand_template(template, &stub.paper_id, &ctx.base_url));
    }

    let record = PaperRecord::from_parts(stub, details);
    tracing::debug!(
        "{} authors, {} institutions, abstract: {}",
        record.authors.len(),
        record.institutions.len(),
        !record.abstract_text.is_empty()
    );

    if !options.skip_pdfs {
        match record.pdf_url.as_deref() {
            None => {
                tracing::info!("No PDF link");
                stats.record_pdf_unavailable();
            }
            Some(pdf_url) => {
                let file_name = namer.file_name(&record.paper_id, &record.title);
                let dest = ctx.layout.session_pdf_dir(session).join(file_name);
                let min_bytes = ctx.config.fetch.min_pdf_bytes;
                let outcome = download_pdf(&mut ctx.fetcher, pdf_url, &dest, min_bytes).await;
                if outcome.is_present() {
                    tracing::info!("PDF {}", outcome);
                } else {
                    tracing::warn!("PDF {} ({})", outcome, pdf_url);
                }
                stats.record_pdf(&outcome);
            }
        }
    }

    Some(record)
}
