use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Target triple of the remote execution environment's bytecode.
pub const WASM_TARGET_TRIPLE: &str = "wasm32-unknown-unknown";

/// A packaged contract binary ready for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    path: PathBuf,
    target: String,
    sha256: String,
    size_bytes: u64,
}

impl Artifact {
    #[must_use]
    pub fn new(path: PathBuf, sha256: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path,
            target: WASM_TARGET_TRIPLE.to_string(),
            sha256: sha256.into(),
            size_bytes,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Hex-encoded SHA-256 of the binary.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
