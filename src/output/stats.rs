//! Run statistics
//!
//! Counters collected while a run progresses, one [`SessionStats`] per
//! session plus run-level failures. The final report is rendered from these.

use crate::model::Session;
use crate::state::{FailureKind, PdfOutcome};
use std::collections::BTreeMap;

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub code: String,
    pub title: String,

    /// Paper stubs found on the listing
    pub papers_found: u64,

    /// Papers that made it into the output files
    pub papers_recorded: u64,

    pub pdfs_downloaded: u64,
    pub pdfs_already_present: u64,
    pub pdfs_failed: u64,

    /// Papers without any PDF URL
    pub pdfs_unavailable: u64,

    pub failures: BTreeMap<FailureKind, u64>,
}

impl SessionStats {
    pub fn new(session: &Session) -> Self {
        Self {
            code: session.code.clone(),
            title: session.title.clone(),
            ..Self::default()
        }
    }

    pub fn record_pdf(&mut self, outcome: &PdfOutcome) {
        match outcome {
            PdfOutcome::Downloaded { .. } => self.pdfs_downloaded += 1,
            PdfOutcome::AlreadyExists { .. } => self.pdfs_already_present += 1,
            PdfOutcome::DownloadFailed { .. } => {
                self.pdfs_failed += 1;
                self.record_failure(FailureKind::PdfDownload);
            }
        }
    }

    pub fn record_pdf_unavailable(&mut self) {
        self.pdfs_unavailable += 1;
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        self.record_failures(kind, 1);
    }

    pub fn record_failures(&mut self, kind: FailureKind, count: u64) {
        if count > 0 {
            *self.failures.entry(kind).or_insert(0) += count;
        }
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }
}

/// Counters for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Sessions in processing order
    pub sessions: Vec<SessionStats>,

    /// Failures not tied to one session (index parsing, run-level files)
    pub run_failures: BTreeMap<FailureKind, u64>,

    /// HTTP requests issued, retries included
    pub requests_sent: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_failure(&mut self, kind: FailureKind) {
        *self.run_failures.entry(kind).or_insert(0) += 1;
    }

    pub fn total_sessions(&self) -> u64 {
        self.sessions.len() as u64
    }

    pub fn total_papers(&self) -> u64 {
        self.sum(|s| s.papers_recorded)
    }

    pub fn pdfs_downloaded(&self) -> u64 {
        self.sum(|s| s.pdfs_downloaded)
    }

    pub fn pdfs_already_present(&self) -> u64 {
        self.sum(|s| s.pdfs_already_present)
    }

    pub fn pdfs_failed(&self) -> u64 {
        self.sum(|s| s.pdfs_failed)
    }

    pub fn pdfs_unavailable(&self) -> u64 {
        self.sum(|s| s.pdfs_unavailable)
    }

    /// Failures per category over the whole run, every category listed
    pub fn failure_totals(&self) -> BTreeMap<FailureKind, u64> {
        let mut totals: BTreeMap<FailureKind, u64> =
            FailureKind::all().into_iter().map(|kind| (kind, 0)).collect();

        for (kind, count) in &self.run_failures {
            *totals.entry(*kind).or_insert(0) += count;
        }
        for session in &self.sessions {
            for (kind, count) in &session.failures {
                *totals.entry(*kind).or_insert(0) += count;
            }
        }
        totals
    }

    pub fn total_failures(&self) -> u64 {
        self.failure_totals().values().sum()
    }

    /// Share of attempted PDFs that are on disk after the run, in percent
    ///
    /// Papers without a PDF URL are not attempts. Returns 0 when nothing was
    /// attempted.
    pub fn pdf_success_rate(&self) -> f64 {
        let present = self.pdfs_downloaded() + self.pdfs_already_present();
        let attempted = present + self.pdfs_failed();
        if attempted == 0 {
            0.0
        } else {
            (present as f64 / attempted as f64) * 100.0
        }
    }

    fn sum(&self, field: impl Fn(&SessionStats) -> u64) -> u64 {
        self.sessions.iter().map(field).sum()
    }
}
