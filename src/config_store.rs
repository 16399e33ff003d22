#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::atomic_file::write_atomically;
use crate::config::split_key_value;
use crate::error::{Result, ShipError};
use crate::remote::{CreateAccountOptions, CreateAccountRequest, RemoteEnvironmentClient, RemoteReceipt};
use crate::types::{AccountId, Identity, StoredIdentity, ACCOUNT_ID_KEY, CONTRACT_ID_KEY};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persists the {accountId, contractId} prologue of the config file.
///
/// The prologue is the first two non-comment lines. Rewrites touch only
/// those lines; every other byte of the file is carried over unchanged.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current binding. A missing file reads as an empty binding.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::IoError` if the file exists but cannot be read and
    /// `ShipError::InvalidField` if a stored id is malformed.
    pub fn read_identity(&self) -> Result<StoredIdentity> {
        if !self.path.exists() {
            return Ok(StoredIdentity::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_prologue(&content)
    }

    /// Binds `account_id` and `contract_id`.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` before touching the file if either
    /// value is blank, `ShipError::IoError` if the rewrite fails.
    pub fn set(&self, account_id: &str, contract_id: &str) -> Result<Identity> {
        let identity = Identity::parse(account_id, contract_id)?;
        self.write_identity(&identity)?;
        Ok(identity)
    }

    /// Creates `new_contract_id` on the remote side under `account_id`, then
    /// binds the pair like [`ConfigStore::set`].
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` before any remote call if either id is
    /// blank; remote failures propagate and leave the file untouched.
    pub async fn create_identity<C>(
        &self,
        client: &C,
        account_id: &str,
        new_contract_id: &str,
        options: CreateAccountOptions,
    ) -> Result<(Identity, RemoteReceipt)>
    where
        C: RemoteEnvironmentClient + ?Sized,
    {
        let identity = Identity::parse(account_id, new_contract_id)?;
        let request = CreateAccountRequest {
            new_account_id: identity.contract_id().clone(),
            master_account_id: identity.account_id().clone(),
            options,
        };

        let receipt = client.create_account(&request).await?;
        info!(
            "Created {} under {}",
            identity.contract_id(),
            identity.account_id()
        );

        self.write_identity(&identity)?;
        Ok((identity, receipt))
    }

    fn write_identity(&self, identity: &Identity) -> Result<()> {
        let current = if self.path.exists() {
            std::fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let updated = rewrite_prologue(&current, identity);
        if updated == current {
            debug!("{} already binds {}", self.path.display(), identity);
            return Ok(());
        }

        write_atomically(&self.path, updated.as_bytes())?;
        info!("Bound {} in {}", identity, self.path.display());
        Ok(())
    }
}

fn is_entry(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn identity_key(line: &str) -> Option<&str> {
    split_key_value(line.trim())
        .map(|(key, _)| key)
        .filter(|key| *key == ACCOUNT_ID_KEY || *key == CONTRACT_ID_KEY)
}

/// Parses the identity out of the first two entries of `content`.
///
/// # Errors
///
/// Returns `ShipError::InvalidField` if a stored id is malformed.
pub fn parse_prologue(content: &str) -> Result<StoredIdentity> {
    let mut stored = StoredIdentity::default();

    for line in content.lines().filter(|line| is_entry(line)).take(2) {
        let Some((key, value)) = split_key_value(line.trim()) else {
            continue;
        };
        let slot = match key {
            ACCOUNT_ID_KEY => &mut stored.account_id,
            CONTRACT_ID_KEY => &mut stored.contract_id,
            _ => continue,
        };
        *slot = match AccountId::parse(key, value) {
            Ok(id) => Some(id),
            Err(ShipError::MissingField { .. }) => None,
            Err(err) => return Err(err),
        };
    }

    Ok(stored)
}

/// Returns `content` with its identity prologue replaced by `identity`.
///
/// Identity lines among the first two entries are dropped. The new prologue
/// takes the place of the first entry when that entry is an identity line,
/// otherwise it is prepended. All remaining lines are copied verbatim.
#[must_use]
pub fn rewrite_prologue(content: &str, identity: &Identity) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let leading_entries: Vec<(usize, bool)> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_entry(line))
        .take(2)
        .map(|(index, line)| (index, identity_key(line).is_some()))
        .collect();
    let prologue_indexes: Vec<usize> = leading_entries
        .iter()
        .filter(|(_, is_identity)| *is_identity)
        .map(|(index, _)| *index)
        .collect();

    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let prologue = format!(
        "{ACCOUNT_ID_KEY} = {}{eol}{CONTRACT_ID_KEY} = {}{eol}",
        identity.account_id(),
        identity.contract_id()
    );
    let insert_at = match leading_entries.first() {
        Some((index, true)) => *index,
        _ => 0,
    };

    let mut out = String::with_capacity(content.len() + prologue.len());
    for (index, line) in lines.iter().enumerate() {
        if index == insert_at {
            out.push_str(&prologue);
        }
        if !prologue_indexes.contains(&index) {
            out.push_str(line);
        }
    }
    if lines.is_empty() {
        out.push_str(&prologue);
    }
    out
}
