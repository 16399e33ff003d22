use crate::cli::{Cli, Commands, DeployArgs, OutputFormat};
use crate::output::emit_output;
use serde_json::json;
use ship::build_pipeline::CargoToolchain;
use ship::config::{load_settings, Settings};
use ship::orchestrator::{CallOptions, DeployOptions, DeployOrchestrator};
use ship::remote::{CreateAccountOptions, NearCliClient, RemoteReceipt};
use ship::types::{Amount, DeployParameters};
use ship::Result;
use std::time::Duration;
use tracing::debug;

type Orchestrator = DeployOrchestrator<NearCliClient, CargoToolchain>;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli.config).await?;
    debug!("Loaded settings from {}", settings.config_path.display());
    let orchestrator = orchestrator_from_settings(settings);
    let output = cli.output;
    let name = cli.command.name();

    match cli.command {
        Commands::Set {
            account_id,
            contract_id,
        } => {
            let identity = orchestrator.set(account_id.as_deref(), contract_id.as_deref())?;
            emit_output(
                output,
                name,
                &json!({
                    "message": format!("Bound {identity}"),
                    "identity": identity,
                }),
            );
            Ok(())
        }
        Commands::New {
            account_id,
            contract_id,
            network,
            initial_balance,
            public_key,
        } => {
            let options = CreateAccountOptions {
                network,
                initial_balance: initial_balance
                    .as_deref()
                    .map(|raw| Amount::parse("initialBalance", raw))
                    .transpose()?,
                public_key,
            };
            let (identity, receipt) = orchestrator
                .create_identity(account_id.as_deref(), contract_id.as_deref(), options)
                .await?;
            emit_output(
                output,
                name,
                &json!({
                    "message": format!("Created and bound {identity}"),
                    "identity": identity,
                    "transaction_id": receipt.transaction_id,
                }),
            );
            Ok(())
        }
        Commands::Del { beneficiary } => {
            let identity = orchestrator.identity()?;
            let receipt = orchestrator
                .teardown(&identity, beneficiary.as_deref())
                .await?;
            emit_receipt(output, name, &receipt);
            Ok(())
        }
        Commands::State => {
            let identity = orchestrator.identity()?;
            let receipt = orchestrator.state(&identity).await?;
            emit_receipt(output, name, &receipt);
            Ok(())
        }
        Commands::Send { amount } => {
            let identity = orchestrator.identity()?;
            let receipt = orchestrator.withdraw(&identity, amount.as_deref()).await?;
            emit_receipt(output, name, &receipt);
            Ok(())
        }
        Commands::Test => {
            let report = orchestrator.test().await?;
            emit_output(output, name, &json!({ "message": report.trim_end() }));
            Ok(())
        }
        Commands::Build => {
            let artifact = orchestrator.build().await?;
            emit_output(
                output,
                name,
                &json!({
                    "message": format!(
                        "Built {} ({} bytes, sha256 {})",
                        artifact.path().display(),
                        artifact.size_bytes(),
                        artifact.sha256()
                    ),
                    "artifact": artifact,
                }),
            );
            Ok(())
        }
        Commands::Deploy(args) | Commands::All(args) => {
            deploy_command(&orchestrator, output, name, &args).await
        }
        Commands::Call {
            method,
            args,
            gas,
            deposit,
        } => {
            let identity = orchestrator.identity()?;
            let receipt = orchestrator
                .call(
                    &identity,
                    method.as_deref(),
                    args.as_deref(),
                    CallOptions { gas, deposit },
                )
                .await?;
            emit_receipt(output, name, &receipt);
            Ok(())
        }
        Commands::View { method, args } => {
            let identity = orchestrator.identity()?;
            let receipt = orchestrator
                .view(&identity, method.as_deref(), args.as_deref())
                .await?;
            emit_receipt(output, name, &receipt);
            Ok(())
        }
        Commands::Clean => {
            orchestrator.clean().await?;
            emit_output(
                output,
                name,
                &json!({
                    "message": format!("Removed {}", orchestrator.settings().out_dir.display()),
                }),
            );
            Ok(())
        }
    }
}

fn orchestrator_from_settings(settings: Settings) -> Orchestrator {
    let client = NearCliClient::new(
        &settings.remote_cli,
        settings.network.clone(),
        Duration::from_millis(settings.remote_timeout_ms),
    );
    let toolchain = CargoToolchain::new(&settings.cargo);
    DeployOrchestrator::new(settings, client, toolchain)
}

async fn deploy_command(
    orchestrator: &Orchestrator,
    output: OutputFormat,
    name: &str,
    args: &DeployArgs,
) -> Result<()> {
    let identity = orchestrator.identity()?;
    let parameters = DeployParameters::from_raw(
        args.init_function.as_deref(),
        args.init_args.as_deref(),
        args.init_gas,
        args.init_deposit.as_deref(),
    )?;
    let receipt = orchestrator
        .deploy(&identity, &parameters, DeployOptions { force: args.force })
        .await?;

    emit_output(
        output,
        name,
        &json!({
            "message": format!(
                "Deployed {} to {} in transaction {}",
                receipt.artifact.path().display(),
                receipt.identity.contract_id(),
                receipt.transaction_id
            ),
            "identity": receipt.identity,
            "artifact": receipt.artifact,
            "transaction_id": receipt.transaction_id,
        }),
    );
    Ok(())
}

fn emit_receipt(output: OutputFormat, name: &str, receipt: &RemoteReceipt) {
    emit_output(
        output,
        name,
        &json!({
            "message": receipt.output.trim_end(),
            "operation": receipt.operation,
            "transaction_id": receipt.transaction_id,
        }),
    );
}
