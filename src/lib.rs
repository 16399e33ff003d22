pub mod atomic_file;
pub mod build_pipeline;
pub mod config;
pub mod config_store;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod orchestrator;
pub mod process;
pub mod remote;
pub mod types;

pub use build_pipeline::{BuildPipeline, CargoToolchain, Toolchain};
pub use config::{load_settings, Settings};
pub use config_store::ConfigStore;
pub use error::{Result, ShipError};
pub use ledger::DeploymentLedger;
pub use orchestrator::{DeployOptions, DeployOrchestrator, DeployReceipt};
pub use remote::{NearCliClient, RemoteEnvironmentClient};
