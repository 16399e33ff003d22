use ship::build_pipeline::{CompileOutput, ToolFuture, ToolOutput, Toolchain};
use ship::remote::{
    CallRequest, CreateAccountRequest, DeleteAccountRequest, DeployRequest,
    RemoteEnvironmentClient, RemoteFuture, RemoteReceipt, SendRequest, StateRequest, ViewRequest,
};
use ship::{Result, ShipError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the fake remote side answers for one operation.
#[derive(Debug, Clone)]
pub enum Scripted {
    Output(String),
    Reject(String),
    Timeout,
}

impl Scripted {
    fn into_result(self, operation: &str) -> Result<RemoteReceipt> {
        match self {
            Self::Output(output) => Ok(RemoteReceipt::new(operation, output)),
            Self::Reject(detail) => Err(ShipError::RemoteRejected {
                operation: operation.to_string(),
                exit_code: Some(1),
                detail,
            }),
            Self::Timeout => Err(ShipError::Timeout {
                operation: operation.to_string(),
                timeout_ms: 10,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreateAccount(CreateAccountRequest),
    DeleteAccount(DeleteAccountRequest),
    State(StateRequest),
    Send(SendRequest),
    Deploy(DeployRequest),
    Call(CallRequest),
    View(ViewRequest),
}

/// Remote client that records every request and answers from a script.
///
/// Unscripted operations succeed with a transaction id.
#[derive(Debug, Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<RemoteCall>>,
    script: Mutex<HashMap<&'static str, Scripted>>,
}

pub const FAKE_TRANSACTION_ID: &str = "9xQzD1fakeTx";

impl RecordingClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_script(self, operation: &'static str, answer: Scripted) -> Self {
        self.set_script(operation, answer);
        self
    }

    pub fn set_script(&self, operation: &'static str, answer: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.insert(operation, answer);
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn respond(&self, operation: &'static str, call: RemoteCall) -> Result<RemoteReceipt> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let answer = self
            .script
            .lock()
            .ok()
            .and_then(|script| script.get(operation).cloned())
            .unwrap_or_else(|| {
                Scripted::Output(format!("Transaction Id {FAKE_TRANSACTION_ID}\nDone"))
            });
        answer.into_result(operation)
    }
}

impl RemoteEnvironmentClient for RecordingClient {
    fn create_account<'a>(
        &'a self,
        request: &'a CreateAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move {
            self.respond("create_account", RemoteCall::CreateAccount(request.clone()))
        })
    }

    fn delete_account<'a>(
        &'a self,
        request: &'a DeleteAccountRequest,
    ) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("delete", RemoteCall::DeleteAccount(request.clone())) })
    }

    fn state<'a>(&'a self, request: &'a StateRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("state", RemoteCall::State(request.clone())) })
    }

    fn send<'a>(&'a self, request: &'a SendRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("send", RemoteCall::Send(request.clone())) })
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("deploy", RemoteCall::Deploy(request.clone())) })
    }

    fn call<'a>(&'a self, request: &'a CallRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("call", RemoteCall::Call(request.clone())) })
    }

    fn view<'a>(&'a self, request: &'a ViewRequest) -> RemoteFuture<'a, RemoteReceipt> {
        Box::pin(async move { self.respond("view", RemoteCall::View(request.clone())) })
    }
}

/// Toolchain that "compiles" by writing a fixed wasm file.
#[derive(Debug)]
pub struct FakeToolchain {
    wasm_path: PathBuf,
    fail_tests: AtomicBool,
    fail_compile: AtomicBool,
    pub test_runs: AtomicUsize,
    pub compiles: AtomicUsize,
    pub cleans: AtomicUsize,
}

impl FakeToolchain {
    #[must_use]
    pub fn new(project_dir: &Path) -> Self {
        Self {
            wasm_path: project_dir.join("target/wasm32-unknown-unknown/release/app.wasm"),
            fail_tests: AtomicBool::new(false),
            fail_compile: AtomicBool::new(false),
            test_runs: AtomicUsize::new(0),
            compiles: AtomicUsize::new(0),
            cleans: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing_tests(self) -> Self {
        self.fail_tests.store(true, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn failing_compile(self) -> Self {
        self.fail_compile.store(true, Ordering::SeqCst);
        self
    }

    fn write_wasm(&self) -> Result<CompileOutput> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if self.fail_compile.load(Ordering::SeqCst) {
            return Ok(CompileOutput {
                result: ToolOutput::failed("error[E0308]: mismatched types"),
                wasm_path: None,
            });
        }
        if let Some(parent) = self.wasm_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.wasm_path, b"\0asm\x01\0\0\0contract")?;
        Ok(CompileOutput {
            result: ToolOutput::passed(""),
            wasm_path: Some(self.wasm_path.clone()),
        })
    }

    #[must_use]
    pub fn stages_run(&self) -> usize {
        self.test_runs.load(Ordering::SeqCst) + self.compiles.load(Ordering::SeqCst)
    }
}

impl Toolchain for FakeToolchain {
    fn run_tests<'a>(&'a self, _project_dir: &'a Path) -> ToolFuture<'a, ToolOutput> {
        Box::pin(async move {
            self.test_runs.fetch_add(1, Ordering::SeqCst);
            // A real test run suspends; let concurrent callers interleave.
            tokio::task::yield_now().await;
            Ok(if self.fail_tests.load(Ordering::SeqCst) {
                ToolOutput::failed("test guess_solution ... FAILED")
            } else {
                ToolOutput::passed("test result: ok. 2 passed")
            })
        })
    }

    fn compile<'a>(&'a self, _project_dir: &'a Path) -> ToolFuture<'a, CompileOutput> {
        Box::pin(async move { self.write_wasm() })
    }

    fn clean<'a>(&'a self, _project_dir: &'a Path) -> ToolFuture<'a, ToolOutput> {
        Box::pin(async move {
            self.cleans.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::passed("Removed 12 files"))
        })
    }
}
