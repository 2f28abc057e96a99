//! Final report generation
//!
//! The report is the one place a user can see, without reading logs,
//! whether a run was complete: per-session counts, totals, and every
//! failure category. It ends with a `key=value` block meant for scripts.

use crate::output::stats::RunStats;
use crate::storage::{write_atomic, OutputLayout};
use crate::OutputResult;
use chrono::{DateTime, Local};

/// Run facts that are not counters
#[derive(Debug, Clone)]
pub struct ReportInfo {
    pub base_url: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub config_hash: Option<String>,
    pub pdfs_skipped: bool,
}

/// Writes `<prefix>_Final_Report.txt`
pub fn write_final_report(
    layout: &OutputLayout,
    stats: &RunStats,
    info: &ReportInfo,
) -> OutputResult<()> {
    let report = format_final_report(stats, info);
    write_atomic(&layout.report_path(), report.as_bytes())
}

/// Formats the final report
///
/// # Arguments
///
/// * `stats` - Counters of the finished run
/// * `info` - Timing and configuration facts
///
/// # Returns
///
/// The report text
pub fn format_final_report(stats: &RunStats, info: &ReportInfo) -> String {
    let mut txt = String::new();
    let rule = "=".repeat(80);

    txt.push_str(&format!("{}\nCONFERENCE HARVEST FINAL REPORT\n{}\n\n", rule, rule));

    // Run information
    txt.push_str(&format!("Source: {}\n", info.base_url));
    txt.push_str(&format!(
        "Started: {}\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    txt.push_str(&format!(
        "Completed: {}\n",
        info.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    let elapsed = (info.finished_at - info.started_at).num_seconds().max(0);
    txt.push_str(&format!(
        "Elapsed: {} seconds ({:.2} minutes)\n",
        elapsed,
        elapsed as f64 / 60.0
    ));
    txt.push_str(&format!(
        "Config Hash: {}\n",
        info.config_hash.as_deref().unwrap_or("defaults")
    ));
    txt.push_str(&format!("HTTP Requests: {}\n\n", stats.requests_sent));

    // Overall statistics
    txt.push_str("OVERVIEW\n--------\n");
    txt.push_str(&format!("Sessions: {}\n", stats.total_sessions()));
    txt.push_str(&format!("Papers: {}\n", stats.total_papers()));
    if info.pdfs_skipped {
        txt.push_str("PDF downloads: skipped for this run\n");
    } else {
        txt.push_str(&format!("PDFs downloaded: {}\n", stats.pdfs_downloaded()));
        txt.push_str(&format!(
            "PDFs already present: {}\n",
            stats.pdfs_already_present()
        ));
        txt.push_str(&format!("PDFs failed: {}\n", stats.pdfs_failed()));
        txt.push_str(&format!(
            "PDFs unavailable (no link): {}\n",
            stats.pdfs_unavailable()
        ));
        txt.push_str(&format!(
            "PDF success rate: {:.1}%\n",
            stats.pdf_success_rate()
        ));
    }
    txt.push_str(&format!("Failures: {}\n\n", stats.total_failures()));

    // Per-session breakdown
    txt.push_str("SESSIONS\n--------\n");
    if stats.sessions.is_empty() {
        txt.push_str("(no sessions processed)\n");
    }
    for session in &stats.sessions {
        txt.push_str(&format!("{} - {}\n", session.code, session.title));
        txt.push_str(&format!(
            "  papers found: {}, recorded: {}\n",
            session.papers_found, session.papers_recorded
        ));
        if !info.pdfs_skipped {
            txt.push_str(&format!(
                "  pdfs downloaded: {}, already present: {}, failed: {}, unavailable: {}\n",
                session.pdfs_downloaded,
                session.pdfs_already_present,
                session.pdfs_failed,
                session.pdfs_unavailable
            ));
        }
        if session.total_failures() > 0 {
            let failures: Vec<String> = session
                .failures
                .iter()
                .map(|(kind, count)| format!("{}={}", kind, count))
                .collect();
            txt.push_str(&format!("  failures: {}\n", failures.join(", ")));
        }
    }
    txt.push('\n');

    // Machine-readable totals
    txt.push_str("TOTALS\n------\n");
    txt.push_str(&format!("total_sessions={}\n", stats.total_sessions()));
    txt.push_str(&format!("total_papers={}\n", stats.total_papers()));
    txt.push_str(&format!("pdfs_downloaded={}\n", stats.pdfs_downloaded()));
    txt.push_str(&format!(
        "pdfs_already_present={}\n",
        stats.pdfs_already_present()
    ));
    txt.push_str(&format!("pdfs_failed={}\n", stats.pdfs_failed()));
    txt.push_str(&format!("pdfs_unavailable={}\n", stats.pdfs_unavailable()));
    for (kind, count) in stats.failure_totals() {
        txt.push_str(&format!("failures.{}={}\n", kind, count));
    }

    txt
}
