mod client;
mod near_cli;
mod requests;

pub use client::{RemoteEnvironmentClient, RemoteFuture};
pub use near_cli::NearCliClient;
pub use requests::{
    parse_transaction_id, CallRequest, CreateAccountOptions, CreateAccountRequest,
    DeleteAccountRequest, DeployRequest, RemoteReceipt, SendRequest, StateRequest, ViewRequest,
};
