use crate::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub type ToolFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Outcome of a toolchain step, with output captured verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    #[must_use]
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    #[must_use]
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Outcome of compiling for the wasm target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub result: ToolOutput,
    pub wasm_path: Option<PathBuf>,
}

/// Compiler toolchain consumed as a black box.
pub trait Toolchain: Send + Sync {
    fn run_tests<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, ToolOutput>;

    fn compile<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, CompileOutput>;

    fn clean<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, ToolOutput>;
}
