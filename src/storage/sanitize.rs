//! Filename sanitization
//!
//! Turns arbitrary titles into single path components that are valid on
//! Windows, macOS and Linux and stay well below the 255-byte component limit.

use std::collections::HashSet;

/// Longest stem (bytes) a sanitized name may have, extension excluded
pub const MAX_STEM_LEN: usize = 120;

/// Characters replaced by `_`
const ILLEGAL_CHARS: &[char] = &[
    '<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']', '(', ')', '{', '}',
];

/// Converts text into a filesystem-safe name
///
/// Illegal and control characters become `_`, whitespace runs collapse to a
/// single space, leading/trailing spaces, dots and underscores are trimmed.
/// Names longer than `max_len` bytes are cut at a char boundary and then back
/// to the last word break. An empty result becomes `"unknown"`.
///
/// # Examples
///
/// ```
/// use conference_harvester::storage::safe_filename;
///
/// assert_eq!(safe_filename("MOA01 - Beam: Status/Plans?", 120), "MOA01 - Beam_ Status_Plans");
/// ```
pub fn safe_filename(name: &str, max_len: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || (c.is_control() && !c.is_whitespace()) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut result = trim_edges(&collapsed).to_string();

    if result.len() > max_len {
        let mut cut = max_len;
        while !result.is_char_boundary(cut) {
            cut -= 1;
        }
        result.truncate(cut);

        if let Some(space) = result.rfind(' ') {
            if space > 0 {
                result.truncate(space);
            }
        }
        result = trim_edges(&result).to_string();
    }

    if result.is_empty() {
        "unknown".to_string()
    } else {
        result
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '.' || c == '_')
}

/// Hands out unique PDF file names within one session directory
///
/// Names are `<PaperID> - <SanitizedTitle>.pdf`. When two names come out
/// identical after truncation, the later one gets its paper ID appended.
/// Comparison ignores case so the result is also unique on case-insensitive
/// filesystems.
#[derive(Debug, Default)]
pub struct PdfNamer {
    used: HashSet<String>,
}

impl PdfNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file name (with `.pdf`) for a paper
    pub fn file_name(&mut self, paper_id: &str, title: &str) -> String {
        let raw = if title.trim().is_empty() {
            paper_id.to_string()
        } else {
            format!("{} - {}", paper_id, title)
        };

        let mut stem = safe_filename(&raw, MAX_STEM_LEN);
        if self.used.contains(&stem.to_lowercase()) {
            let suffix = format!(" - {}", safe_filename(paper_id, MAX_STEM_LEN / 2));
            let room = MAX_STEM_LEN.saturating_sub(suffix.len());
            stem = format!("{}{}", safe_filename(&raw, room), suffix);

            let mut counter = 2;
            let base = stem.clone();
            while self.used.contains(&stem.to_lowercase()) {
                stem = format!("{}_{}", base, counter);
                counter += 1;
            }
        }

        self.used.insert(stem.to_lowercase());
        format!("{}.pdf", stem)
    }
}
