//! Run-level index files
//!
//! `<prefix>_Complete_Index.json` holds every session and every record of
//! the run; `<prefix>_All_Papers.csv` is its flat counterpart with the
//! session title prepended to each row.

use crate::model::{HarvestedSession, PaperRecord};
use crate::output::session_files::{into_bytes, record_fields, RECORD_COLUMNS};
use crate::storage::{write_atomic, OutputLayout};
use crate::OutputResult;
use serde::{Deserialize, Serialize};

/// One session line of the master index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSession {
    pub code: String,
    pub title: String,
    pub listing_url: String,
    pub paper_count: usize,
}

/// The master index of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestIndex {
    pub total_sessions: usize,
    pub total_papers: usize,
    pub sessions: Vec<IndexSession>,
    /// Every record, grouped by session in run order, by paper id within
    pub papers: Vec<PaperRecord>,
}

impl HarvestIndex {
    pub fn build(sessions: &[HarvestedSession]) -> Self {
        let papers: Vec<PaperRecord> = sessions
            .iter()
            .flat_map(|harvested| harvested.sorted_records().into_iter().cloned())
            .collect();

        let sessions: Vec<IndexSession> = sessions
            .iter()
            .map(|harvested| IndexSession {
                code: harvested.session.code.clone(),
                title: harvested.session.title.clone(),
                listing_url: harvested.session.listing_url.clone(),
                paper_count: harvested.records.len(),
            })
            .collect();

        Self {
            total_sessions: sessions.len(),
            total_papers: papers.len(),
            sessions,
            papers,
        }
    }
}

/// Writes the master JSON index
pub fn write_index(layout: &OutputLayout, index: &HarvestIndex) -> OutputResult<()> {
    let mut json = serde_json::to_vec_pretty(index)?;
    json.push(b'\n');
    write_atomic(&layout.index_path(), &json)
}

/// Writes the global CSV of every paper
pub fn write_all_papers_csv(
    layout: &OutputLayout,
    sessions: &[HarvestedSession],
) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["session_title"];
    header.extend(RECORD_COLUMNS);
    writer.write_record(&header)?;

    for harvested in sessions {
        for record in harvested.sorted_records() {
            let mut row = vec![harvested.session.title.clone()];
            row.extend(record_fields(record));
            writer.write_record(&row)?;
        }
    }

    write_atomic(&layout.all_papers_csv_path(), &into_bytes(writer)?)
}
