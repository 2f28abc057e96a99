use crate::{OutputError, OutputResult};
use std::io::Write;
use std::path::Path;

/// Writes `contents` to `path` so that readers only ever see the complete file
///
/// The data goes to a hidden `.part` temp file in the destination directory
/// which is then renamed over `path`. A process killed mid-write leaves at
/// most a stray temp file, never a truncated file under the final name.
pub fn write_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(".harvest-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| OutputError::filesystem(dir, e))?;

    temp.write_all(contents)
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| OutputError::filesystem(temp.path(), e))?;

    temp.persist(path)
        .map_err(|e| OutputError::filesystem(path, e.error))?;

    Ok(())
}
