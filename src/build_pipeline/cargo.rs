//! Cargo-backed toolchain producing size-optimised, reproducible wasm.

use super::toolchain::{CompileOutput, ToolFuture, ToolOutput, Toolchain};
use crate::process::{run_command, CommandSpec};
use crate::types::WASM_TARGET_TRIPLE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Release-profile overrides applied to every contract build.
///
/// Fixed optimisation level, one codegen unit, LTO and no debug info keep
/// builds bit-identical across runs; overflow checks stay on so arithmetic
/// overflow traps instead of wrapping.
pub const RELEASE_PROFILE_OVERRIDES: [(&str, &str); 9] = [
    ("CARGO_PROFILE_RELEASE_OPT_LEVEL", "z"),
    ("CARGO_PROFILE_RELEASE_CODEGEN_UNITS", "1"),
    ("CARGO_PROFILE_RELEASE_LTO", "true"),
    ("CARGO_PROFILE_RELEASE_DEBUG", "false"),
    ("CARGO_PROFILE_RELEASE_STRIP", "true"),
    ("CARGO_PROFILE_RELEASE_PANIC", "abort"),
    ("CARGO_PROFILE_RELEASE_OVERFLOW_CHECKS", "true"),
    ("CARGO_PROFILE_RELEASE_DEBUG_ASSERTIONS", "false"),
    ("CARGO_PROFILE_RELEASE_INCREMENTAL", "false"),
];

/// The extension of a built wasm file
pub const WASM_EXTENSION: &str = "wasm";

#[derive(Debug, Deserialize)]
struct CargoMessage {
    reason: String,
    #[serde(default)]
    filenames: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CargoToolchain {
    program: String,
}

impl CargoToolchain {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn test_command(&self, project_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(["test"])
            .cwd(project_dir)
    }

    #[must_use]
    pub fn build_command(&self, project_dir: &Path) -> CommandSpec {
        RELEASE_PROFILE_OVERRIDES.iter().fold(
            CommandSpec::new(&self.program)
                .args([
                    "build",
                    "--release",
                    "--target",
                    WASM_TARGET_TRIPLE,
                    "--message-format=json-render-diagnostics",
                ])
                .cwd(project_dir),
            |spec, (key, value)| spec.env(*key, *value),
        )
    }

    #[must_use]
    pub fn clean_command(&self, project_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(["clean"])
            .cwd(project_dir)
    }

    async fn run_step(&self, spec: CommandSpec, operation: &str) -> crate::Result<ToolOutput> {
        let output = run_command(&spec, operation, None).await?;
        Ok(ToolOutput {
            success: output.success(),
            output: output.combined(),
        })
    }

    async fn run_build(&self, project_dir: &Path) -> crate::Result<CompileOutput> {
        let output = run_command(&self.build_command(project_dir), "compile", None).await?;
        let (wasm_path, plain_stdout) = scan_build_messages(&output.stdout);

        let mut diagnostics = plain_stdout;
        diagnostics.push_str(&output.stderr);

        Ok(CompileOutput {
            result: ToolOutput {
                success: output.success(),
                output: diagnostics,
            },
            wasm_path,
        })
    }
}

impl Default for CargoToolchain {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CARGO)
    }
}

impl Toolchain for CargoToolchain {
    fn run_tests<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, ToolOutput> {
        Box::pin(self.run_step(self.test_command(project_dir), "test"))
    }

    fn compile<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, CompileOutput> {
        Box::pin(self.run_build(project_dir))
    }

    fn clean<'a>(&'a self, project_dir: &'a Path) -> ToolFuture<'a, ToolOutput> {
        Box::pin(self.run_step(self.clean_command(project_dir), "clean"))
    }
}

/// Picks the last wasm file reported in cargo's JSON messages.
///
/// Returns it together with any stdout lines that were not JSON messages.
#[must_use]
pub fn scan_build_messages(stdout: &str) -> (Option<PathBuf>, String) {
    let mut wasm_path = None;
    let mut plain = String::new();

    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        match serde_json::from_str::<CargoMessage>(line) {
            Ok(message) if message.reason == "compiler-artifact" => {
                if let Some(path) = message
                    .filenames
                    .into_iter()
                    .filter(|path| path.extension().is_some_and(|ext| ext == WASM_EXTENSION))
                    .last()
                {
                    wasm_path = Some(path);
                }
            }
            Ok(_) => {}
            Err(_) => {
                plain.push_str(line);
                plain.push('\n');
            }
        }
    }

    (wasm_path, plain)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn build_command_pins_target_and_release_profile() {
        let spec = CargoToolchain::default().build_command(Path::new("/work/contract"));
        assert_eq!(spec.program, "cargo");
        assert!(spec.args.iter().any(|a| a == WASM_TARGET_TRIPLE));
        assert!(spec.args.iter().any(|a| a == "--release"));
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/work/contract")));
        let env = |key: &str| {
            spec.envs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(env("CARGO_PROFILE_RELEASE_OVERFLOW_CHECKS"), Some("true"));
        assert_eq!(env("CARGO_PROFILE_RELEASE_CODEGEN_UNITS"), Some("1"));
        assert_eq!(env("CARGO_PROFILE_RELEASE_LTO"), Some("true"));
        assert_eq!(env("CARGO_PROFILE_RELEASE_DEBUG"), Some("false"));
    }

    #[test]
    fn scan_finds_the_wasm_artifact() {
        let stdout = concat!(
            r#"{"reason":"compiler-artifact","filenames":["/t/release/deps/libserde.rlib"]}"#,
            "\n",
            r#"{"reason":"compiler-artifact","filenames":["/t/wasm32-unknown-unknown/release/app.wasm","/t/wasm32-unknown-unknown/release/libapp.rlib"]}"#,
            "\n",
            r#"{"reason":"build-finished","success":true}"#,
            "\n"
        );
        let (path, plain) = scan_build_messages(stdout);
        assert_eq!(
            path,
            Some(PathBuf::from("/t/wasm32-unknown-unknown/release/app.wasm"))
        );
        assert!(plain.is_empty());
    }

    #[test]
    fn scan_keeps_non_json_lines() {
        let (path, plain) = scan_build_messages("warning: something odd\n");
        assert_eq!(path, None);
        assert_eq!(plain, "warning: something odd\n");
    }
}
