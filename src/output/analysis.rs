//! Statistics over a finished run's master index
//!
//! Backs the `analyze-results` binary: load the JSON index, aggregate,
//! print.

use crate::output::index::HarvestIndex;
use crate::{OutputError, OutputResult};
use std::collections::HashMap;
use std::path::Path;

/// How many institutions the summary lists
pub const TOP_INSTITUTIONS: usize = 10;

/// Aggregate counts of a master index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStatistics {
    pub total_sessions: usize,
    pub total_papers: usize,

    /// `(code, title, paper count)` in index order
    pub papers_per_session: Vec<(String, String, usize)>,

    pub with_abstract: usize,
    pub with_doi: usize,
    pub with_pdf_link: usize,

    /// Papers with at least one normalized (ISO) date
    pub with_parsed_dates: usize,

    /// Author entries over all papers
    pub total_authors: usize,
    /// Distinct author names
    pub unique_authors: usize,
    pub unique_institutions: usize,

    /// Institutions by number of papers, most first, ties by name
    pub top_institutions: Vec<(String, usize)>,
}

/// Loads a master index file
///
/// # Errors
///
/// * `OutputError::MissingIndex` - the file does not exist
/// * `OutputError::Filesystem` - the file cannot be read
/// * `OutputError::Json` - the file is not a valid index
pub fn load_index(path: &Path) -> OutputResult<HarvestIndex> {
    if !path.exists() {
        return Err(OutputError::MissingIndex(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| OutputError::filesystem(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

impl IndexStatistics {
    pub fn from_index(index: &HarvestIndex) -> Self {
        let papers = &index.papers;

        let mut institution_papers: HashMap<&str, usize> = HashMap::new();
        let mut authors: HashMap<&str, usize> = HashMap::new();
        for paper in papers {
            for author in &paper.authors {
                *authors.entry(author.as_str()).or_insert(0) += 1;
            }
            let mut seen: Vec<&str> = Vec::new();
            for institution in &paper.institutions {
                if !seen.contains(&institution.as_str()) {
                    seen.push(institution.as_str());
                    *institution_papers.entry(institution.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut top_institutions: Vec<(String, usize)> = institution_papers
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect();
        top_institutions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_institutions.truncate(TOP_INSTITUTIONS);

        Self {
            total_sessions: index.sessions.len(),
            total_papers: papers.len(),
            papers_per_session: index
                .sessions
                .iter()
                .map(|s| (s.code.clone(), s.title.clone(), s.paper_count))
                .collect(),
            with_abstract: papers
                .iter()
                .filter(|p| !p.abstract_text.trim().is_empty())
                .count(),
            with_doi: papers.iter().filter(|p| p.doi.is_some()).count(),
            with_pdf_link: papers.iter().filter(|p| p.pdf_url.is_some()).count(),
            with_parsed_dates: papers
                .iter()
                .filter(|p| {
                    [&p.received_date, &p.accepted_date]
                        .iter()
                        .any(|d| d.as_ref().map(|d| d.normalized).unwrap_or(false))
                })
                .count(),
            total_authors: papers.iter().map(|p| p.authors.len()).sum(),
            unique_authors: authors.len(),
            unique_institutions: institution_papers.len(),
            top_institutions,
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Sessions: {}", stats.total_sessions);
    println!("  Papers: {}", stats.total_papers);
    println!();

    println!("Papers per Session:");
    for (code, title, count) in &stats.papers_per_session {
        println!("  {} - {}: {}", code, title, count);
    }
    println!();

    println!("Field Coverage:");
    for (label, count) in [
        ("Abstract", stats.with_abstract),
        ("DOI", stats.with_doi),
        ("PDF link", stats.with_pdf_link),
        ("Parsed dates", stats.with_parsed_dates),
    ] {
        println!(
            "  {}: {} ({:.1}%)",
            label,
            count,
            percent(count, stats.total_papers)
        );
    }
    println!();

    println!("People:");
    println!("  Author entries: {}", stats.total_authors);
    println!("  Unique authors: {}", stats.unique_authors);
    println!("  Unique institutions: {}", stats.unique_institutions);
    println!();

    if !stats.top_institutions.is_empty() {
        println!("Top {} Institutions:", stats.top_institutions.len());
        for (name, count) in &stats.top_institutions {
            println!("  - {} ({} papers)", name, count);
        }
    }
}
