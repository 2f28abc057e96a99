use crate::model::Session;
use crate::storage::atomic::write_atomic;
use crate::storage::sanitize::{safe_filename, MAX_STEM_LEN};
use crate::{OutputError, OutputResult};
use std::path::{Path, PathBuf};

/// The on-disk tree of one run
///
/// ```text
/// <output_dir>/
///   Sessions/<Code> - <Title>/{papers_data.json, papers_data.csv, papers_summary.txt}
///   PDFs/<Code> - <Title>/<PaperID> - <Title>.pdf
///   <prefix>_Complete_Index.json
///   <prefix>_All_Papers.csv
///   <prefix>_Final_Report.txt
///   Debug/
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    prefix: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("Sessions")
    }

    pub fn pdfs_dir(&self) -> PathBuf {
        self.root.join("PDFs")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.root.join("Debug")
    }

    /// Directory name shared by a session's data and PDF folders
    pub fn session_dir_name(session: &Session) -> String {
        safe_filename(&session.display_name(), MAX_STEM_LEN)
    }

    pub fn session_data_dir(&self, session: &Session) -> PathBuf {
        self.sessions_dir().join(Self::session_dir_name(session))
    }

    pub fn session_pdf_dir(&self, session: &Session) -> PathBuf {
        self.pdfs_dir().join(Self::session_dir_name(session))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root
            .join(format!("{}_Complete_Index.json", self.prefix))
    }

    pub fn all_papers_csv_path(&self) -> PathBuf {
        self.root.join(format!("{}_All_Papers.csv", self.prefix))
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(format!("{}_Final_Report.txt", self.prefix))
    }

    /// Creates the root and its fixed subdirectories
    pub fn prepare(&self) -> OutputResult<()> {
        for dir in [
            self.root.clone(),
            self.sessions_dir(),
            self.pdfs_dir(),
            self.debug_dir(),
        ] {
            create_dir(&dir)?;
        }
        Ok(())
    }

    /// Creates both per-session directories
    pub fn prepare_session(&self, session: &Session) -> OutputResult<()> {
        create_dir(&self.session_data_dir(session))?;
        create_dir(&self.session_pdf_dir(session))
    }

    /// Saves a raw page under Debug/ for later diagnosis
    pub fn save_debug_capture(&self, label: &str, content: &str) -> OutputResult<PathBuf> {
        let path = self
            .debug_dir()
            .join(format!("{}.html", safe_filename(label, MAX_STEM_LEN)));
        write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }
}

fn create_dir(dir: &Path) -> OutputResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| OutputError::filesystem(dir, e))
}
