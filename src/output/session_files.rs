//! Per-session output files
//!
//! Writes `papers_data.json`, `papers_data.csv` and `papers_summary.txt`
//! into a session's data directory. Everything is derived from the
//! in-memory records only and carries no timestamps, so writing the same
//! records twice yields byte-identical files.

use crate::model::{sorted_by_id, PaperDate, PaperRecord, Session};
use crate::storage::{write_atomic, OutputLayout};
use crate::{OutputError, OutputResult};
use serde::Serialize;
use std::path::PathBuf;

pub const JSON_FILE: &str = "papers_data.json";
pub const CSV_FILE: &str = "papers_data.csv";
pub const SUMMARY_FILE: &str = "papers_summary.txt";

/// Joins author and institution lists in flat formats
pub const LIST_DELIMITER: &str = "; ";

/// Column order of every paper CSV
pub const RECORD_COLUMNS: [&str; 10] = [
    "paper_id",
    "title",
    "authors",
    "institutions",
    "abstract",
    "pdf_url",
    "doi",
    "received_date",
    "accepted_date",
    "session_code",
];

#[derive(Serialize)]
struct SessionFile<'a> {
    session: &'a Session,
    paper_count: usize,
    papers: Vec<&'a PaperRecord>,
}

/// Writes the three session files and returns the data directory
pub fn write_session_files(
    layout: &OutputLayout,
    session: &Session,
    records: &[PaperRecord],
) -> OutputResult<PathBuf> {
    let dir = layout.session_data_dir(session);
    std::fs::create_dir_all(&dir).map_err(|e| OutputError::filesystem(&dir, e))?;

    let sorted = sorted_by_id(records);

    write_atomic(&dir.join(JSON_FILE), &session_json(session, &sorted)?)?;
    write_atomic(&dir.join(CSV_FILE), &session_csv(&sorted)?)?;
    write_atomic(
        &dir.join(SUMMARY_FILE),
        session_summary(session, &sorted).as_bytes(),
    )?;

    Ok(dir)
}

fn session_json(session: &Session, sorted: &[&PaperRecord]) -> OutputResult<Vec<u8>> {
    let file = SessionFile {
        session,
        paper_count: sorted.len(),
        papers: sorted.to_vec(),
    };
    let mut json = serde_json::to_vec_pretty(&file)?;
    json.push(b'\n');
    Ok(json)
}

fn session_csv(sorted: &[&PaperRecord]) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RECORD_COLUMNS)?;
    for record in sorted {
        writer.write_record(record_fields(record))?;
    }
    into_bytes(writer)
}

pub(crate) fn into_bytes(writer: csv::Writer<Vec<u8>>) -> OutputResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| OutputError::Csv(csv::Error::from(e.into_error())))
}

/// Flat CSV fields of a record, in [`RECORD_COLUMNS`] order
pub(crate) fn record_fields(record: &PaperRecord) -> [String; 10] {
    [
        record.paper_id.clone(),
        record.title.clone(),
        record.authors.join(LIST_DELIMITER),
        record.institutions.join(LIST_DELIMITER),
        record.abstract_text.clone(),
        record.pdf_url.clone().unwrap_or_default(),
        record.doi.clone().unwrap_or_default(),
        date_text(record.received_date.as_ref()),
        date_text(record.accepted_date.as_ref()),
        record.session_code.clone(),
    ]
}

fn date_text(date: Option<&PaperDate>) -> String {
    date.map(|d| d.value.clone()).unwrap_or_default()
}

fn session_summary(session: &Session, sorted: &[&PaperRecord]) -> String {
    let mut txt = String::new();

    txt.push_str(&format!("Session: {}\n", session.display_name()));
    txt.push_str(&format!("Listing: {}\n", session.listing_url));
    txt.push_str(&format!("Papers: {}\n", sorted.len()));
    txt.push_str(&"=".repeat(80));
    txt.push('\n');

    for (index, record) in sorted.iter().enumerate() {
        let authors = record.authors.join(LIST_DELIMITER);
        let institutions = record.institutions.join(LIST_DELIMITER);
        let received = date_text(record.received_date.as_ref());
        let accepted = date_text(record.accepted_date.as_ref());

        txt.push('\n');
        txt.push_str(&format!("{}. {} - {}\n", index + 1, record.paper_id, record.title));
        txt.push_str(&format!("   Authors: {}\n", or_none(&authors)));
        txt.push_str(&format!("   Institutions: {}\n", or_none(&institutions)));
        txt.push_str(&format!("   PDF: {}\n", record.pdf_url.as_deref().unwrap_or("n/a")));
        txt.push_str(&format!("   DOI: {}\n", record.doi.as_deref().unwrap_or("n/a")));
        txt.push_str(&format!("   Received: {}\n", or_none(&received)));
        txt.push_str(&format!("   Accepted: {}\n", or_none(&accepted)));
        txt.push_str(&format!("   Abstract: {}\n", or_none(&record.abstract_text)));
    }

    txt
}

fn or_none(text: &str) -> &str {
    if text.is_empty() {
        "n/a"
    } else {
        text
    }
}
