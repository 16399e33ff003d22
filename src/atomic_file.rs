use crate::error::{Result, ShipError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Replaces `path` with `contents` in one step.
///
/// The bytes go to a temp file in the same directory, are synced, and the temp
/// file is renamed over `path`. Readers see either the old or the new file.
///
/// # Errors
///
/// Returns `ShipError::IoError` if the temp file cannot be written or renamed.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.flush()?;
    staged.as_file().sync_all()?;
    persist(staged, path)?;

    debug!("Atomically wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Copies `source` over `destination` through a same-directory temp file.
///
/// # Errors
///
/// Returns `ShipError::IoError` if reading, writing or renaming fails.
pub fn copy_atomically(source: &Path, destination: &Path) -> Result<u64> {
    let dir = parent_dir(destination);
    std::fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    let mut reader = std::fs::File::open(source)?;
    let copied = std::io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    persist(staged, destination)?;
    Ok(copied)
}

fn persist(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged
        .persist(path)
        .map(|_| ())
        .map_err(|err| ShipError::IoError(err.error))
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
