#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::build_pipeline::{BuildLayout, BuildPipeline, Toolchain};
use crate::config::Settings;
use crate::config_store::ConfigStore;
use crate::error::{FailedStage, Result, ShipError};
use crate::ledger::{DeploymentLedger, DeploymentRecord, DeploymentStatus};
use crate::lock::ProjectLock;
use crate::remote::{
    CallRequest, CreateAccountOptions, DeleteAccountRequest, DeployRequest,
    RemoteEnvironmentClient, RemoteReceipt, SendRequest, StateRequest, ViewRequest,
};
use crate::types::{AccountId, Amount, Artifact, DeployParameters, Identity, JsonArgs};
use serde::Serialize;
use tracing::{info, warn};

const TEARDOWN_TARGET: &str = "ship::teardown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Deploy even though the last deploy of this contract was never confirmed.
    pub force: bool,
}

/// Gas and deposit attached to a mutating call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub gas: Option<u64>,
    pub deposit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReceipt {
    pub identity: Identity,
    pub artifact: Artifact,
    pub transaction_id: String,
    pub output: String,
}

/// Sequences identity, build and remote operations for one project.
///
/// Nothing reaches the network until every local precondition holds.
pub struct DeployOrchestrator<C, T> {
    settings: Settings,
    store: ConfigStore,
    ledger: DeploymentLedger,
    client: C,
    toolchain: T,
}

impl<C, T> DeployOrchestrator<C, T>
where
    C: RemoteEnvironmentClient,
    T: Toolchain,
{
    #[must_use]
    pub fn new(settings: Settings, client: C, toolchain: T) -> Self {
        Self {
            store: ConfigStore::new(&settings.config_path),
            ledger: DeploymentLedger::new(&settings.ledger_path),
            settings,
            client,
            toolchain,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    #[must_use]
    pub const fn ledger(&self) -> &DeploymentLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub const fn toolchain(&self) -> &T {
        &self.toolchain
    }

    fn lock(&self) -> Result<ProjectLock> {
        ProjectLock::acquire(self.settings.lock_path())
    }

    fn pipeline(&self) -> BuildPipeline<'_, T> {
        BuildPipeline::new(&self.toolchain, BuildLayout::from_settings(&self.settings))
    }

    /// The bound identity.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` naming the first unset entry.
    pub fn identity(&self) -> Result<Identity> {
        self.store.read_identity()?.require()
    }

    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for a blank id or `ShipError::Busy`
    /// when another run holds the lock.
    pub fn set(&self, account_id: Option<&str>, contract_id: Option<&str>) -> Result<Identity> {
        let identity = Identity::parse(account_id.unwrap_or(""), contract_id.unwrap_or(""))?;
        let _lock = self.lock()?;
        self.store
            .set(identity.account_id().value(), identity.contract_id().value())
    }

    /// Creates a contract account under `account_id`, or under the bound
    /// account when none is given, and binds the pair.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` before any remote call when either
    /// id is unknown, `ShipError::RemoteRejected` if creation fails.
    pub async fn create_identity(
        &self,
        account_id: Option<&str>,
        new_contract_id: Option<&str>,
        options: CreateAccountOptions,
    ) -> Result<(Identity, RemoteReceipt)> {
        let account_id = match account_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self
                .store
                .read_identity()?
                .account_id
                .map(|id| id.value().to_string())
                .ok_or_else(|| ShipError::missing(crate::types::ACCOUNT_ID_KEY))?,
        };
        let identity = Identity::parse(&account_id, new_contract_id.unwrap_or(""))?;

        let _lock = self.lock()?;
        self.store
            .create_identity(
                &self.client,
                identity.account_id().value(),
                identity.contract_id().value(),
                options,
            )
            .await
    }

    /// Runs only the contract test suite.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::BuildFailure` with the captured test output.
    pub async fn test(&self) -> Result<String> {
        self.pipeline().run_tests_only().await
    }

    /// Tests, compiles and packages the contract.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::Busy` if locked, otherwise the failing stage.
    pub async fn build(&self) -> Result<Artifact> {
        let _lock = self.lock()?;
        self.pipeline().run().await
    }

    /// Builds and uploads the contract with an optional init call.
    ///
    /// An upload that times out, or succeeds without a transaction id, is
    /// recorded as unconfirmed; the next deploy of that contract then needs
    /// `force`.
    ///
    /// # Errors
    ///
    /// Local failures (parameters, lock, build) return before any remote
    /// call. Remote failures propagate unchanged and are never retried.
    pub async fn deploy(
        &self,
        identity: &Identity,
        parameters: &DeployParameters,
        options: DeployOptions,
    ) -> Result<DeployReceipt> {
        parameters.validate()?;
        let _lock = self.lock()?;
        self.ensure_confirmed(identity.contract_id(), options)?;

        let artifact = self.pipeline().run().await?;

        let request = DeployRequest {
            contract_id: identity.contract_id().clone(),
            wasm_file: artifact.path().to_path_buf(),
            parameters: parameters.clone(),
        };
        info!(
            "Deploying {} ({} bytes) to {}",
            artifact.path().display(),
            artifact.size_bytes(),
            identity.contract_id()
        );

        match self.client.deploy(&request).await {
            Ok(RemoteReceipt {
                transaction_id: Some(transaction_id),
                output,
                ..
            }) => {
                self.note_deploy(
                    identity,
                    &artifact,
                    Some(&transaction_id),
                    DeploymentStatus::Confirmed,
                );
                info!(
                    "Deployed {} in transaction {}",
                    identity.contract_id(),
                    transaction_id
                );
                Ok(DeployReceipt {
                    identity: identity.clone(),
                    artifact,
                    transaction_id,
                    output,
                })
            }
            Ok(receipt) => {
                self.note_deploy(identity, &artifact, None, DeploymentStatus::Unconfirmed);
                Err(ShipError::Unconfirmed {
                    operation: receipt.operation,
                    detail: format!(
                        "remote tool reported success for {} without a transaction id",
                        identity.contract_id()
                    ),
                })
            }
            Err(err) if err.is_ambiguous() => {
                self.note_deploy(identity, &artifact, None, DeploymentStatus::Unconfirmed);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Same as [`DeployOrchestrator::deploy`].
    ///
    /// # Errors
    ///
    /// See [`DeployOrchestrator::deploy`].
    pub async fn all(
        &self,
        identity: &Identity,
        parameters: &DeployParameters,
        options: DeployOptions,
    ) -> Result<DeployReceipt> {
        self.deploy(identity, parameters, options).await
    }

    fn ensure_confirmed(&self, contract_id: &AccountId, options: DeployOptions) -> Result<()> {
        let Some(record) = self.ledger.get(contract_id.value())? else {
            return Ok(());
        };
        if !record.is_unconfirmed() {
            return Ok(());
        }
        if options.force {
            warn!(
                "Forcing deploy of {} over unconfirmed deploy from {}",
                contract_id,
                record.recorded_at.to_rfc3339()
            );
            return Ok(());
        }
        Err(ShipError::Unconfirmed {
            operation: "deploy".to_string(),
            detail: format!(
                "previous deploy of {} at {} was never confirmed; check 'ship state' and rerun with --force",
                contract_id,
                record.recorded_at.to_rfc3339()
            ),
        })
    }

    fn note_deploy(
        &self,
        identity: &Identity,
        artifact: &Artifact,
        transaction_id: Option<&str>,
        status: DeploymentStatus,
    ) {
        let record = DeploymentRecord::new(
            identity.account_id().value(),
            artifact.sha256(),
            transaction_id.map(ToString::to_string),
            status,
        );
        if let Err(err) = self.ledger.record(identity.contract_id().value(), record) {
            warn!(
                "Failed to update deployment ledger {}: {}",
                self.ledger.path().display(),
                err
            );
        }
    }

    /// Mutating call signed by the bound account. Never rebuilds.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for a missing method before any
    /// remote call.
    pub async fn call(
        &self,
        identity: &Identity,
        method: Option<&str>,
        args: Option<&str>,
        options: CallOptions,
    ) -> Result<RemoteReceipt> {
        let (method, args) = method_and_args(method, args)?;
        let deposit = options
            .deposit
            .as_deref()
            .map(|raw| Amount::parse("deposit", raw))
            .transpose()?;

        let request = CallRequest {
            contract_id: identity.contract_id().clone(),
            method,
            args,
            signer_id: identity.account_id().clone(),
            gas: options.gas,
            deposit,
        };
        let receipt = self.client.call(&request).await?;
        warn_if_unconfirmed(&receipt);
        Ok(receipt)
    }

    /// Read-only call; no signer is sent.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for a missing method.
    pub async fn view(
        &self,
        identity: &Identity,
        method: Option<&str>,
        args: Option<&str>,
    ) -> Result<RemoteReceipt> {
        let (method, args) = method_and_args(method, args)?;
        let request = ViewRequest {
            contract_id: identity.contract_id().clone(),
            method,
            args,
        };
        self.client.view(&request).await
    }

    /// Sends `amount` from the account to the contract.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingAmount` without sending anything when no
    /// amount is given.
    pub async fn withdraw(
        &self,
        identity: &Identity,
        amount: Option<&str>,
    ) -> Result<RemoteReceipt> {
        let raw = amount
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(ShipError::MissingAmount)?;
        let request = SendRequest {
            sender_id: identity.account_id().clone(),
            receiver_id: identity.contract_id().clone(),
            amount: Amount::parse("amount", raw)?,
        };
        let receipt = self.client.send(&request).await?;
        warn_if_unconfirmed(&receipt);
        Ok(receipt)
    }

    /// Deletes the contract account, sending its balance to `beneficiary`
    /// or to the bound account.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::Busy` if locked or the remote failure.
    pub async fn teardown(
        &self,
        identity: &Identity,
        beneficiary: Option<&str>,
    ) -> Result<RemoteReceipt> {
        let beneficiary_id = match beneficiary.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => AccountId::parse("beneficiary", id)?,
            None => identity.account_id().clone(),
        };
        let _lock = self.lock()?;

        warn!(
            target: TEARDOWN_TARGET,
            "Deleting contract account {} and transferring its balance to {}; this cannot be undone",
            identity.contract_id(),
            beneficiary_id
        );
        let request = DeleteAccountRequest {
            account_id: identity.contract_id().clone(),
            beneficiary_id,
        };
        let receipt = self.client.delete_account(&request).await?;
        warn!(target: TEARDOWN_TARGET, "Deleted {}", identity.contract_id());

        if let Err(err) = self.ledger.remove(identity.contract_id().value()) {
            warn!("Failed to drop {} from ledger: {}", identity.contract_id(), err);
        }
        Ok(receipt)
    }

    /// Remote account state of the contract.
    ///
    /// # Errors
    ///
    /// Returns the remote failure.
    pub async fn state(&self, identity: &Identity) -> Result<RemoteReceipt> {
        let request = StateRequest {
            account_id: identity.contract_id().clone(),
        };
        self.client.state(&request).await
    }

    /// Removes the output directory and the compiler's build cache.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::Busy` if locked, `ShipError::IoError` if the output
    /// directory cannot be removed.
    pub async fn clean(&self) -> Result<String> {
        let _lock = self.lock()?;

        match tokio::fs::remove_dir_all(&self.settings.out_dir).await {
            Ok(()) => info!("Removed {}", self.settings.out_dir.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let outcome = self.toolchain.clean(&self.settings.contract_dir).await?;
        if outcome.success {
            Ok(outcome.output)
        } else {
            Err(ShipError::BuildFailure {
                stage: FailedStage::Compiling,
                output: outcome.output,
            })
        }
    }
}

fn method_and_args(method: Option<&str>, args: Option<&str>) -> Result<(String, JsonArgs)> {
    let method = method
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ShipError::missing("method"))?;
    let args = match args.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => JsonArgs::parse("args", raw)?,
        None => JsonArgs::empty_object(),
    };
    Ok((method.to_string(), args))
}

fn warn_if_unconfirmed(receipt: &RemoteReceipt) {
    if receipt.transaction_id.is_none() {
        warn!(
            "Remote {} reported success without a transaction id",
            receipt.operation
        );
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::method_and_args;
    use crate::error::ShipError;

    #[test]
    fn args_default_to_empty_object() {
        let (method, args) = method_and_args(Some("get_solution"), None).unwrap();
        assert_eq!(method, "get_solution");
        assert_eq!(args.as_str(), "{}");
    }

    #[test]
    fn blank_method_is_missing() {
        let err = method_and_args(Some("  "), Some("{}")).unwrap_err();
        assert!(matches!(err, ShipError::MissingField { ref field } if field == "method"));
    }

    #[test]
    fn malformed_args_are_invalid() {
        let err = method_and_args(Some("set_solution"), Some("{solution: x")).unwrap_err();
        assert!(matches!(err, ShipError::InvalidField { ref field, .. } if field == "args"));
    }
}
