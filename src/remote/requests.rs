use crate::types::{AccountId, Amount, DeployParameters, JsonArgs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Optional settings forwarded to account creation, each only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountOptions {
    pub network: Option<String>,
    pub initial_balance: Option<Amount>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountRequest {
    pub new_account_id: AccountId,
    pub master_account_id: AccountId,
    pub options: CreateAccountOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAccountRequest {
    pub account_id: AccountId,
    pub beneficiary_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRequest {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub contract_id: AccountId,
    pub wasm_file: PathBuf,
    pub parameters: DeployParameters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub contract_id: AccountId,
    pub method: String,
    pub args: JsonArgs,
    pub signer_id: AccountId,
    pub gas: Option<u64>,
    pub deposit: Option<Amount>,
}

/// Read-only call; carries no signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub contract_id: AccountId,
    pub method: String,
    pub args: JsonArgs,
}

/// What the remote side reported for a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReceipt {
    pub operation: String,
    pub transaction_id: Option<String>,
    pub output: String,
}

impl RemoteReceipt {
    #[must_use]
    pub fn new(operation: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        Self {
            operation: operation.into(),
            transaction_id: parse_transaction_id(&output),
            output,
        }
    }
}

/// Extracts the transaction id from remote tool output.
///
/// Recognises `Transaction Id <id>` lines and explorer links ending in
/// `/transactions/<id>`.
#[must_use]
pub fn parse_transaction_id(output: &str) -> Option<String> {
    let from_label = output.lines().find_map(|line| {
        line.split_once("Transaction Id ")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(ToString::to_string)
    });

    from_label.or_else(|| {
        output.lines().find_map(|line| {
            line.split_once("/transactions/")
                .and_then(|(_, rest)| rest.split(|c: char| c.is_whitespace() || c == '?').next())
                .filter(|id| !id.is_empty())
                .map(ToString::to_string)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::parse_transaction_id;

    #[test]
    fn transaction_id_from_label_line() {
        let output = "Starting deployment.\nTransaction Id 8jvQ3mTkq2B2 \nDone deploying";
        assert_eq!(parse_transaction_id(output).as_deref(), Some("8jvQ3mTkq2B2"));
    }

    #[test]
    fn transaction_id_from_explorer_link() {
        let output = "Open https://explorer.testnet.near.org/transactions/H1x9eZ?tab=logs\n";
        assert_eq!(parse_transaction_id(output).as_deref(), Some("H1x9eZ"));
    }

    #[test]
    fn no_transaction_id_in_view_output() {
        assert_eq!(parse_transaction_id("View call: app.get_solution()\n'abc'"), None);
    }
}
