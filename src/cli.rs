use clap::{Args, Parser, Subcommand, ValueEnum};
use ship::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ship")]
#[command(about = "Test, build and deploy a wasm smart contract")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file holding the identity prologue and settings
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

// Required values are Options so a missing one is reported by name through
// the same error path as every other validation failure.
#[derive(Subcommand)]
pub enum Commands {
    /// Bind an existing account and contract
    Set {
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long)]
        contract_id: Option<String>,
    },
    /// Create the contract account under the owner account and bind both
    New {
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long)]
        contract_id: Option<String>,
        #[arg(long)]
        network: Option<String>,
        #[arg(long)]
        initial_balance: Option<String>,
        #[arg(long)]
        public_key: Option<String>,
    },
    /// Delete the contract account
    Del {
        /// Receives the remaining balance; defaults to the bound account
        #[arg(long)]
        beneficiary: Option<String>,
    },
    /// Show remote state of the contract account
    State,
    /// Send tokens from the account to the contract
    Send { amount: Option<String> },
    /// Run the contract test suite
    Test,
    /// Test, compile and package the contract into the output directory
    Build,
    /// Build the contract and deploy it, optionally calling an init function
    Deploy(DeployArgs),
    /// Same as deploy
    All(DeployArgs),
    /// Call a change method on the contract, signed by the account
    Call {
        method: Option<String>,
        args: Option<String>,
        #[arg(long)]
        gas: Option<u64>,
        #[arg(long)]
        deposit: Option<String>,
    },
    /// Call a read-only method on the contract
    View {
        method: Option<String>,
        args: Option<String>,
    },
    /// Remove the output directory and the compiler cache
    Clean,
}

impl Commands {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::New { .. } => "new",
            Self::Del { .. } => "del",
            Self::State => "state",
            Self::Send { .. } => "send",
            Self::Test => "test",
            Self::Build => "build",
            Self::Deploy(_) => "deploy",
            Self::All(_) => "all",
            Self::Call { .. } => "call",
            Self::View { .. } => "view",
            Self::Clean => "clean",
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct DeployArgs {
    #[arg(long)]
    pub init_function: Option<String>,
    #[arg(long)]
    pub init_args: Option<String>,
    #[arg(long)]
    pub init_gas: Option<u64>,
    #[arg(long)]
    pub init_deposit: Option<String>,
    /// Deploy over an unconfirmed previous deploy
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
