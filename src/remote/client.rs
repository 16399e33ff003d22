use super::requests::{
    CallRequest, CreateAccountRequest, DeleteAccountRequest, DeployRequest, RemoteReceipt,
    SendRequest, StateRequest, ViewRequest,
};
use crate::Result;
use std::future::Future;
use std::pin::Pin;

pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Typed boundary to the remote execution environment.
///
/// Implementations never retry: a rejected or timed-out call is reported once
/// and any retry is a new, explicit caller action.
pub trait RemoteEnvironmentClient: Send + Sync {
    fn create_account<'a>(
        &'a self,
        request: &'a CreateAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt>;

    fn delete_account<'a>(
        &'a self,
        request: &'a DeleteAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt>;

    fn state<'a>(&'a self, request: &'a StateRequest) -> RemoteFuture<'a, RemoteReceipt>;

    fn send<'a>(&'a self, request: &'a SendRequest) -> RemoteFuture<'a, RemoteReceipt>;

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> RemoteFuture<'a, RemoteReceipt>;

    fn call<'a>(&'a self, request: &'a CallRequest) -> RemoteFuture<'a, RemoteReceipt>;

    fn view<'a>(&'a self, request: &'a ViewRequest) -> RemoteFuture<'a, RemoteReceipt>;
}
