#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod cargo;
mod packaging;
mod toolchain;

pub use cargo::{scan_build_messages, CargoToolchain, RELEASE_PROFILE_OVERRIDES, WASM_EXTENSION};
pub use packaging::package_artifact;
pub use toolchain::{CompileOutput, ToolFuture, ToolOutput, Toolchain};

use crate::config::Settings;
use crate::error::{FailedStage, Result, ShipError};
use crate::types::{Artifact, BuildState};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Where the pipeline reads sources and writes the packaged artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub contract_dir: PathBuf,
    pub out_dir: PathBuf,
    pub artifact_name: String,
}

impl BuildLayout {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            contract_dir: settings.contract_dir.clone(),
            out_dir: settings.out_dir.clone(),
            artifact_name: settings.artifact_name.clone(),
        }
    }
}

/// Test -> compile -> package state machine.
///
/// Any stage failure moves to `Failed` and leaves the output directory as it
/// was; only `Packaging` writes there.
pub struct BuildPipeline<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
    layout: BuildLayout,
    state: BuildState,
    history: Vec<BuildState>,
}

impl<'a, T: Toolchain + ?Sized> BuildPipeline<'a, T> {
    #[must_use]
    pub fn new(toolchain: &'a T, layout: BuildLayout) -> Self {
        Self {
            toolchain,
            layout,
            state: BuildState::Idle,
            history: vec![BuildState::Idle],
        }
    }

    #[must_use]
    pub const fn state(&self) -> BuildState {
        self.state
    }

    /// Every state visited by the last run, starting with `Idle`.
    #[must_use]
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    fn reset(&mut self) {
        self.state = BuildState::Idle;
        self.history = vec![BuildState::Idle];
    }

    fn transition(&mut self, target: BuildState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(ShipError::Internal(format!(
                "illegal build transition {} -> {}",
                self.state, target
            )));
        }
        self.state = target;
        self.history.push(target);
        Ok(())
    }

    fn fail(&mut self, err: ShipError) -> ShipError {
        warn!("Build failed in state {}: {}", self.state, err);
        if self.transition(BuildState::Failed).is_err() {
            warn!("Build already terminal in state {}", self.state);
        }
        err
    }

    /// Runs every stage and returns the packaged artifact.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::BuildFailure` naming the failing stage with its
    /// captured output, or the underlying IO/config error.
    pub async fn run(&mut self) -> Result<Artifact> {
        self.reset();
        let start = Instant::now();

        match self.run_stages().await {
            Ok(artifact) => {
                info!(
                    "Build done in {}ms: {} (sha256 {})",
                    start.elapsed().as_millis(),
                    artifact.path().display(),
                    artifact.sha256()
                );
                Ok(artifact)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Runs only the test stage, ending in `Failed` or back at `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::BuildFailure` with the captured test output.
    pub async fn run_tests_only(&mut self) -> Result<String> {
        self.reset();
        match self.testing().await {
            Ok(output) => {
                self.state = BuildState::Idle;
                Ok(output)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn run_stages(&mut self) -> Result<Artifact> {
        self.testing().await?;
        let compiled = self.compiling().await?;
        let artifact = self.packaging(compiled)?;
        self.transition(BuildState::Done)?;
        Ok(artifact)
    }

    async fn testing(&mut self) -> Result<String> {
        self.transition(BuildState::Testing)?;
        info!("Running tests in {}", self.layout.contract_dir.display());

        let outcome = self.toolchain.run_tests(&self.layout.contract_dir).await?;
        if outcome.success {
            Ok(outcome.output)
        } else {
            Err(ShipError::BuildFailure {
                stage: FailedStage::Testing,
                output: outcome.output,
            })
        }
    }

    async fn compiling(&mut self) -> Result<PathBuf> {
        self.transition(BuildState::Compiling)?;
        info!("Compiling {}", self.layout.contract_dir.display());

        let outcome = self.toolchain.compile(&self.layout.contract_dir).await?;
        if !outcome.result.success {
            return Err(ShipError::BuildFailure {
                stage: FailedStage::Compiling,
                output: outcome.result.output,
            });
        }
        outcome.wasm_path.ok_or_else(|| ShipError::BuildFailure {
            stage: FailedStage::Compiling,
            output: format!(
                "compiler reported success but produced no .{WASM_EXTENSION} artifact\n{}",
                outcome.result.output
            ),
        })
    }

    fn packaging(&mut self, compiled: PathBuf) -> Result<Artifact> {
        self.transition(BuildState::Packaging)?;
        package_artifact(&compiled, &self.layout.out_dir, &self.layout.artifact_name)
    }
}
