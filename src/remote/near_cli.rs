use super::client::{RemoteEnvironmentClient, RemoteFuture};
use super::requests::{
    CallRequest, CreateAccountRequest, DeleteAccountRequest, DeployRequest, RemoteReceipt,
    SendRequest, StateRequest, ViewRequest,
};
use crate::error::{Result, ShipError};
use crate::process::{run_command, CommandSpec};
use std::time::Duration;
use tracing::{info, warn};

/// Remote client that shells out to the `near` command-line tool.
#[derive(Debug, Clone)]
pub struct NearCliClient {
    program: String,
    network: Option<String>,
    timeout: Duration,
}

impl NearCliClient {
    #[must_use]
    pub fn new(program: impl Into<String>, network: Option<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            network,
            timeout,
        }
    }

    fn with_network(&self, mut args: Vec<String>, network: Option<&str>) -> Vec<String> {
        if let Some(network) = network.or(self.network.as_deref()) {
            args.push("--networkId".to_string());
            args.push(network.to_string());
        }
        args
    }

    async fn run(&self, operation: &'static str, args: Vec<String>) -> Result<RemoteReceipt> {
        let spec = CommandSpec::new(&self.program).args(args);
        info!("Remote {operation}: {}", spec.display());

        let output = run_command(&spec, operation, Some(self.timeout)).await?;
        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            warn!("Remote {operation} rejected: {detail}");
            return Err(ShipError::RemoteRejected {
                operation: operation.to_string(),
                exit_code: output.exit_code,
                detail,
            });
        }

        Ok(RemoteReceipt::new(operation, output.stdout))
    }

    #[must_use]
    pub fn create_account_args(&self, request: &CreateAccountRequest) -> Vec<String> {
        let mut args = vec![
            "create-account".to_string(),
            request.new_account_id.to_string(),
            "--masterAccount".to_string(),
            request.master_account_id.to_string(),
        ];
        if let Some(balance) = &request.options.initial_balance {
            args.extend(["--initialBalance".to_string(), balance.to_string()]);
        }
        if let Some(key) = &request.options.public_key {
            args.extend(["--publicKey".to_string(), key.clone()]);
        }
        self.with_network(args, request.options.network.as_deref())
    }

    #[must_use]
    pub fn delete_account_args(&self, request: &DeleteAccountRequest) -> Vec<String> {
        self.with_network(
            vec![
                "delete".to_string(),
                request.account_id.to_string(),
                request.beneficiary_id.to_string(),
            ],
            None,
        )
    }

    #[must_use]
    pub fn state_args(&self, request: &StateRequest) -> Vec<String> {
        self.with_network(
            vec!["state".to_string(), request.account_id.to_string()],
            None,
        )
    }

    #[must_use]
    pub fn send_args(&self, request: &SendRequest) -> Vec<String> {
        self.with_network(
            vec![
                "send".to_string(),
                request.sender_id.to_string(),
                request.receiver_id.to_string(),
                request.amount.to_string(),
            ],
            None,
        )
    }

    #[must_use]
    pub fn deploy_args(&self, request: &DeployRequest) -> Vec<String> {
        let params = &request.parameters;
        let mut args = vec![
            "deploy".to_string(),
            request.contract_id.to_string(),
            request.wasm_file.display().to_string(),
        ];
        if let Some(function) = &params.init_function {
            args.extend(["--initFunction".to_string(), function.clone()]);
        }
        if let Some(init_args) = &params.init_args {
            args.extend(["--initArgs".to_string(), init_args.to_string()]);
        }
        if let Some(gas) = params.init_gas {
            args.extend(["--initGas".to_string(), gas.to_string()]);
        }
        if let Some(deposit) = &params.init_deposit {
            args.extend(["--initDeposit".to_string(), deposit.to_string()]);
        }
        self.with_network(args, None)
    }

    #[must_use]
    pub fn call_args(&self, request: &CallRequest) -> Vec<String> {
        let mut args = vec![
            "call".to_string(),
            request.contract_id.to_string(),
            request.method.clone(),
            request.args.to_string(),
            "--accountId".to_string(),
            request.signer_id.to_string(),
        ];
        if let Some(gas) = request.gas {
            args.extend(["--gas".to_string(), gas.to_string()]);
        }
        if let Some(deposit) = &request.deposit {
            args.extend(["--deposit".to_string(), deposit.to_string()]);
        }
        self.with_network(args, None)
    }

    #[must_use]
    pub fn view_args(&self, request: &ViewRequest) -> Vec<String> {
        self.with_network(
            vec![
                "view".to_string(),
                request.contract_id.to_string(),
                request.method.clone(),
                request.args.to_string(),
            ],
            None,
        )
    }
}

impl RemoteEnvironmentClient for NearCliClient {
    fn create_account<'a>(
        &'a self,
        request: &'a CreateAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("create-account", self.create_account_args(request)))
    }

    fn delete_account<'a>(
        &'a self,
        request: &'a DeleteAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("delete", self.delete_account_args(request)))
    }

    fn state<'a>(&'a self, request: &'a StateRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("state", self.state_args(request)))
    }

    fn send<'a>(&'a self, request: &'a SendRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("send", self.send_args(request)))
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("deploy", self.deploy_args(request)))
    }

    fn call<'a>(&'a self, request: &'a CallRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("call", self.call_args(request)))
    }

    fn view<'a>(&'a self, request: &'a ViewRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(self.run("view", self.view_args(request)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::remote::CreateAccountOptions;
    use crate::types::{AccountId, Amount, DeployParameters, JsonArgs};
    use std::path::PathBuf;

    fn id(raw: &str) -> AccountId {
        AccountId::parse("id", raw).unwrap()
    }

    fn client(network: Option<&str>) -> NearCliClient {
        NearCliClient::new(
            "near",
            network.map(ToString::to_string),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn deploy_args_omit_absent_init_fields() {
        let request = DeployRequest {
            contract_id: id("app.alice.testnet"),
            wasm_file: PathBuf::from("out/main.wasm"),
            parameters: DeployParameters::default(),
        };
        assert_eq!(
            client(None).deploy_args(&request),
            vec!["deploy", "app.alice.testnet", "out/main.wasm"]
        );
    }

    #[test]
    fn deploy_args_forward_every_present_init_field() {
        let request = DeployRequest {
            contract_id: id("app.alice.testnet"),
            wasm_file: PathBuf::from("out/main.wasm"),
            parameters: DeployParameters::from_raw(
                Some("new"),
                Some("{}"),
                Some(300_000_000_000_000),
                Some("0"),
            )
            .unwrap(),
        };
        assert_eq!(
            client(Some("testnet")).deploy_args(&request),
            vec![
                "deploy",
                "app.alice.testnet",
                "out/main.wasm",
                "--initFunction",
                "new",
                "--initArgs",
                "{}",
                "--initGas",
                "300000000000000",
                "--initDeposit",
                "0",
                "--networkId",
                "testnet",
            ]
        );
    }

    #[test]
    fn view_args_carry_no_signer() {
        let request = ViewRequest {
            contract_id: id("app.alice.testnet"),
            method: "get_solution".to_string(),
            args: JsonArgs::default(),
        };
        let args = client(None).view_args(&request);
        assert_eq!(args, vec!["view", "app.alice.testnet", "get_solution", "{}"]);
        assert!(!args.iter().any(|arg| arg == "--accountId"));
    }

    #[test]
    fn call_args_are_signed_by_the_account() {
        let request = CallRequest {
            contract_id: id("app.alice.testnet"),
            method: "set_solution".to_string(),
            args: JsonArgs::parse("args", r#"{"solution":"x"}"#).unwrap(),
            signer_id: id("alice.testnet"),
            gas: None,
            deposit: Some(Amount::parse("deposit", "1").unwrap()),
        };
        assert_eq!(
            client(None).call_args(&request),
            vec![
                "call",
                "app.alice.testnet",
                "set_solution",
                r#"{"solution":"x"}"#,
                "--accountId",
                "alice.testnet",
                "--deposit",
                "1",
            ]
        );
    }

    #[test]
    fn create_account_network_option_overrides_client_network() {
        let request = CreateAccountRequest {
            new_account_id: id("app.alice.testnet"),
            master_account_id: id("alice.testnet"),
            options: CreateAccountOptions {
                network: Some("mainnet".to_string()),
                initial_balance: Some(Amount::parse("initialBalance", "5").unwrap()),
                public_key: None,
            },
        };
        assert_eq!(
            client(Some("testnet")).create_account_args(&request),
            vec![
                "create-account",
                "app.alice.testnet",
                "--masterAccount",
                "alice.testnet",
                "--initialBalance",
                "5",
                "--networkId",
                "mainnet",
            ]
        );
    }

    #[test]
    fn send_and_delete_args_follow_positional_order() {
        let c = client(None);
        let send = SendRequest {
            sender_id: id("alice.testnet"),
            receiver_id: id("app.alice.testnet"),
            amount: Amount::parse("amount", "2.5").unwrap(),
        };
        assert_eq!(
            c.send_args(&send),
            vec!["send", "alice.testnet", "app.alice.testnet", "2.5"]
        );
        let delete = DeleteAccountRequest {
            account_id: id("app.alice.testnet"),
            beneficiary_id: id("alice.testnet"),
        };
        assert_eq!(
            c.delete_account_args(&delete),
            vec!["delete", "app.alice.testnet", "alice.testnet"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_remote_rejected() {
        let rejecting = NearCliClient::new("false", None, Duration::from_secs(5));
        let request = StateRequest {
            account_id: id("app.alice.testnet"),
        };
        let err = rejecting.state(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ShipError::RemoteRejected { ref operation, exit_code: Some(1), .. } if operation == "state"
        ));
    }
}
