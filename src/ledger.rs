//! Local record of what was deployed where.
//!
//! Stored as pretty JSON keyed by contract id:
//!
//! ```json
//! { "deployments": { "app.alice.testnet": { "status": "confirmed", ... } } }
//! ```

use crate::atomic_file::write_atomically;
use crate::error::{Result, ShipError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Confirmed,
    /// The upload may or may not have landed.
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub account_id: String,
    pub artifact_sha256: String,
    pub transaction_id: Option<String>,
    pub status: DeploymentStatus,
    pub recorded_at: DateTime<Utc>,
}

impl DeploymentRecord {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        artifact_sha256: impl Into<String>,
        transaction_id: Option<String>,
        status: DeploymentStatus,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            artifact_sha256: artifact_sha256.into(),
            transaction_id,
            status,
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        self.status == DeploymentStatus::Unconfirmed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentRecord>,
}

#[derive(Debug, Clone)]
pub struct DeploymentLedger {
    path: PathBuf,
}

impl DeploymentLedger {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the ledger; a missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::ConfigError` if the file exists but is not a ledger.
    pub fn load(&self) -> Result<Ledger> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Ledger::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|err| {
                ShipError::ConfigError(format!(
                    "Failed to parse deployment ledger {}: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn get(&self, contract_id: &str) -> Result<Option<DeploymentRecord>> {
        Ok(self.load()?.deployments.remove(contract_id))
    }

    /// Inserts or replaces the record for `contract_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or rewritten.
    pub fn record(&self, contract_id: &str, record: DeploymentRecord) -> Result<()> {
        let mut ledger = self.load()?;
        debug!(
            "Recording {} deployment of {}",
            serde_json::to_string(&record.status)?,
            contract_id
        );
        ledger.deployments.insert(contract_id.to_string(), record);
        self.store(&ledger)
    }

    /// Drops the record for `contract_id`, returning it if there was one.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or rewritten.
    pub fn remove(&self, contract_id: &str) -> Result<Option<DeploymentRecord>> {
        let mut ledger = self.load()?;
        let removed = ledger.deployments.remove(contract_id);
        if removed.is_some() {
            self.store(&ledger)?;
        }
        Ok(removed)
    }

    fn store(&self, ledger: &Ledger) -> Result<()> {
        let mut json = serde_json::to_string_pretty(ledger)?;
        json.push('\n');
        write_atomically(&self.path, json.as_bytes())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> DeploymentLedger {
        DeploymentLedger::new(dir.path().join(".ship/deployments.json"))
    }

    #[test]
    fn missing_ledger_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        assert!(ledger.load().unwrap().deployments.is_empty());
        assert_eq!(ledger.get("app.alice.testnet").unwrap(), None);
    }

    #[test]
    fn record_then_get_returns_latest() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger
            .record(
                "app.alice.testnet",
                DeploymentRecord::new("alice.testnet", "aa", None, DeploymentStatus::Unconfirmed),
            )
            .unwrap();
        ledger
            .record(
                "app.alice.testnet",
                DeploymentRecord::new(
                    "alice.testnet",
                    "bb",
                    Some("9xQ".to_string()),
                    DeploymentStatus::Confirmed,
                ),
            )
            .unwrap();

        let record = ledger.get("app.alice.testnet").unwrap().unwrap();
        assert_eq!(record.artifact_sha256, "bb");
        assert_eq!(record.transaction_id.as_deref(), Some("9xQ"));
        assert!(!record.is_unconfirmed());
    }

    #[test]
    fn status_serializes_lowercase() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger
            .record(
                "c.testnet",
                DeploymentRecord::new("a.testnet", "ff", None, DeploymentStatus::Unconfirmed),
            )
            .unwrap();
        let raw = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(raw.contains("\"status\": \"unconfirmed\""));
        assert!(raw.contains("\"c.testnet\""));
    }

    #[test]
    fn remove_only_touches_named_contract() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        for contract in ["one.testnet", "two.testnet"] {
            ledger
                .record(
                    contract,
                    DeploymentRecord::new("a.testnet", "ff", None, DeploymentStatus::Confirmed),
                )
                .unwrap();
        }

        assert!(ledger.remove("one.testnet").unwrap().is_some());
        assert!(ledger.remove("one.testnet").unwrap().is_none());
        assert!(ledger.get("two.testnet").unwrap().is_some());
    }

    #[test]
    fn corrupt_ledger_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::create_dir_all(ledger.path().parent().unwrap()).unwrap();
        std::fs::write(ledger.path(), "not json").unwrap();
        assert!(matches!(ledger.load(), Err(ShipError::ConfigError(_))));
    }
}
