use crate::error::{Result, ShipError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the persisted account entry.
pub const ACCOUNT_ID_KEY: &str = "accountId";
/// Key of the persisted contract entry.
pub const CONTRACT_ID_KEY: &str = "contractId";

/// Opaque account handle interpreted by the remote environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Validates a raw value for the named field.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for blank input and
    /// `ShipError::InvalidField` when the value spans lines or holds whitespace.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ShipError::missing(field));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ShipError::invalid(
                field,
                "account ids cannot contain whitespace or line breaks",
            ));
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (account, contract) binding every remote operation runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    account_id: AccountId,
    contract_id: AccountId,
}

impl Identity {
    #[must_use]
    pub const fn new(account_id: AccountId, contract_id: AccountId) -> Self {
        Self {
            account_id,
            contract_id,
        }
    }

    /// # Errors
    ///
    /// Returns `ShipError::MissingField` naming the first absent field.
    pub fn parse(account_id: &str, contract_id: &str) -> Result<Self> {
        Ok(Self::new(
            AccountId::parse(ACCOUNT_ID_KEY, account_id)?,
            AccountId::parse(CONTRACT_ID_KEY, contract_id)?,
        ))
    }

    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    #[must_use]
    pub const fn contract_id(&self) -> &AccountId {
        &self.contract_id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.account_id, self.contract_id)
    }
}

/// Identity as read back from the config file, where either half may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredIdentity {
    pub account_id: Option<AccountId>,
    pub contract_id: Option<AccountId>,
}

impl StoredIdentity {
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` naming the first unset entry.
    pub fn require(&self) -> Result<Identity> {
        let account_id = self
            .account_id
            .clone()
            .ok_or_else(|| ShipError::missing(ACCOUNT_ID_KEY))?;
        let contract_id = self
            .contract_id
            .clone()
            .ok_or_else(|| ShipError::missing(CONTRACT_ID_KEY))?;
        Ok(Identity::new(account_id, contract_id))
    }
}
