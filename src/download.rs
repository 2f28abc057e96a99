//! PDF downloader
//!
//! A PDF counts as done purely because its file exists, so an interrupted
//! run picks up where it stopped without any checkpoint file. Files only
//! appear under their final name once complete (see [`write_atomic`]).

use crate::crawler::Fetcher;
use crate::state::PdfOutcome;
use crate::storage::write_atomic;
use std::path::Path;

/// Downloads `url` to `dest` unless a file is already there
///
/// # Arguments
///
/// * `fetcher` - The run's fetcher (throttled, retrying)
/// * `url` - Absolute PDF URL
/// * `dest` - Final path of the PDF
/// * `min_bytes` - Bodies shorter than this are rejected as not a real PDF
///
/// # Returns
///
/// * `AlreadyExists` - `dest` exists; no request was made
/// * `Downloaded` - The body was written to `dest`
/// * `DownloadFailed` - Fetch failed, the body was too small, or the write failed
pub async fn download_pdf(
    fetcher: &mut Fetcher,
    url: &str,
    dest: &Path,
    min_bytes: u64,
) -> PdfOutcome {
    if dest.exists() {
        tracing::debug!("PDF already present: {}", dest.display());
        return PdfOutcome::AlreadyExists {
            path: dest.to_path_buf(),
        };
    }

    let body = match fetcher.fetch_bytes(url).await {
        Ok(body) => body,
        Err(e) => {
            return PdfOutcome::DownloadFailed {
                cause: e.to_string(),
            }
        }
    };

    let bytes = body.len() as u64;
    if bytes < min_bytes {
        return PdfOutcome::DownloadFailed {
            cause: format!(
                "response too small to be a PDF ({} bytes, minimum {})",
                bytes, min_bytes
            ),
        };
    }

    match write_atomic(dest, &body) {
        Ok(()) => {
            tracing::debug!("Saved {} ({} bytes)", dest.display(), bytes);
            PdfOutcome::Downloaded {
                path: dest.to_path_buf(),
                bytes,
            }
        }
        Err(e) => PdfOutcome::DownloadFailed {
            cause: e.to_string(),
        },
    }
}
