//! Output module for persisting harvest results
//!
//! This module handles:
//! - Per-session JSON/CSV/TXT files
//! - The master index and the global CSV
//! - Run statistics and the final report
//! - Reading an index back for the analyze-results tool

pub mod analysis;
pub mod index;
pub mod report;
pub mod session_files;
pub mod stats;

pub use analysis::{load_index, print_statistics, IndexStatistics};
pub use index::{write_all_papers_csv, write_index, HarvestIndex, IndexSession};
pub use report::{format_final_report, write_final_report, ReportInfo};
pub use session_files::write_session_files;
pub use stats::{RunStats, SessionStats};
