use crate::atomic_file::copy_atomically;
use crate::error::{FailedStage, Result, ShipError};
use crate::types::Artifact;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

use super::cargo::WASM_EXTENSION;

/// Prunes stale binaries from `out_dir`, then copies `compiled` into
/// `out_dir/artifact_name`.
///
/// The new artifact is staged and renamed into place as the last step, so
/// any failure leaves the previous artifact intact.
///
/// # Errors
///
/// Returns `ShipError::BuildFailure` if `compiled` does not exist and
/// `ShipError::IoError` for filesystem failures.
pub fn package_artifact(compiled: &Path, out_dir: &Path, artifact_name: &str) -> Result<Artifact> {
    if !compiled.is_file() {
        return Err(ShipError::BuildFailure {
            stage: FailedStage::Packaging,
            output: format!("compiled binary not found at {}", compiled.display()),
        });
    }

    let bytes = std::fs::read(compiled)?;
    let digest = format!("{:x}", Sha256::digest(&bytes));

    prune_stale_binaries(out_dir, artifact_name)?;
    let destination = out_dir.join(artifact_name);
    let size_bytes = copy_atomically(compiled, &destination)?;

    debug!(
        "Packaged {} ({} bytes, sha256 {})",
        destination.display(),
        size_bytes,
        digest
    );
    Ok(Artifact::new(destination, digest, size_bytes))
}

fn prune_stale_binaries(out_dir: &Path, keep: &str) -> Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(out_dir)? {
        let path = entry?.path();
        let is_stale = path.is_file()
            && path.extension().is_some_and(|ext| ext == WASM_EXTENSION)
            && path.file_name().is_some_and(|name| name != keep);
        if is_stale {
            debug!("Removing stale artifact {}", path.display());
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
