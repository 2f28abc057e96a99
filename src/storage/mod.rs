//! Storage module for persisting harvest output
//!
//! This module handles everything that touches the output tree:
//! - The fixed directory layout of a run
//! - Filename sanitization and unique PDF naming
//! - Atomic file writes (temp file + rename)
//! - Resumability: a PDF counts as done purely because its file exists

mod atomic;
mod layout;
mod sanitize;

pub use atomic::write_atomic;
pub use layout::OutputLayout;
pub use sanitize::{safe_filename, PdfNamer, MAX_STEM_LEN};
