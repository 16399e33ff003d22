use crate::error::{Result, ShipError};
use chrono::Utc;
use fs4::fs_std::FileExt;
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive guard over the config file and output directory.
///
/// Backed by an OS advisory lock on the lock file, so the kernel releases it
/// when the holding process exits for any reason. Acquisition never blocks:
/// a second run fails with `ShipError::Busy`. The file itself stays on disk
/// and only records the last holder.
#[derive(Debug)]
pub struct ProjectLock {
    path: PathBuf,
    file: File,
}

impl ProjectLock {
    /// # Errors
    ///
    /// Returns `ShipError::Busy` if another handle holds the lock and
    /// `ShipError::IoError` if the lock file cannot be opened or written.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if !file.try_lock_exclusive()? {
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            warn!(
                "Lock {} is held: {}",
                path.display(),
                holder.lines().collect::<Vec<_>>().join(", ")
            );
            return Err(ShipError::Busy {
                path: path.display().to_string(),
            });
        }

        // Dropping `file` on any error below releases the lock.
        file.set_len(0)?;
        file.rewind()?;
        writeln!(file, "pid = {}", std::process::id())?;
        writeln!(file, "acquired_at = {}", Utc::now().to_rfc3339())?;
        file.flush()?;
        debug!("Acquired project lock {}", path.display());

        Ok(Self { path, file })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), err);
        } else {
            debug!("Released project lock {}", self.path.display());
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_held() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ship.conf.lock");

        let _held = ProjectLock::acquire(&path).unwrap();
        let err = ProjectLock::acquire(&path).unwrap_err();

        assert!(matches!(err, ShipError::Busy { .. }));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ship.conf.lock");

        {
            let lock = ProjectLock::acquire(&path).unwrap();
            assert!(lock.path().exists());
        }

        assert!(ProjectLock::acquire(&path).is_ok());
    }

    #[test]
    fn leftover_file_from_a_dead_run_does_not_block() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ship.conf.lock");
        fs::write(&path, "pid = 999999\nacquired_at = 2024-01-01T00:00:00Z\n").unwrap();

        let lock = ProjectLock::acquire(&path).unwrap();

        let contents = fs::read_to_string(lock.path()).unwrap();
        assert!(!contents.contains("999999"));
    }

    #[test]
    fn lock_file_records_holder_pid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ship.conf.lock");

        let _lock = ProjectLock::acquire(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        assert!(contents.contains(&format!("pid = {}", std::process::id())));
        assert_eq!(contents.lines().count(), 2);
    }
}
