use crate::error::{Result, ShipError};
use itertools::Itertools;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub const MAX_OUTPUT_CAPTURE_BYTES: usize = 1_048_576;

#[derive(Debug, Clone)]
pub struct StreamCapture {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

/// Reads `stream` to the end, keeping at most `max_bytes`.
///
/// # Errors
///
/// Returns `ShipError::IoError` if reading fails.
pub async fn capture_stream_limited<R>(mut stream: R, max_bytes: usize) -> Result<StreamCapture>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut chunk = [0_u8; 8_192];

    loop {
        let read = stream.read(&mut chunk).await.map_err(ShipError::IoError)?;
        if read == 0 {
            break;
        }

        let remaining = max_bytes.saturating_sub(bytes.len());
        if remaining == 0 {
            truncated = true;
            continue;
        }

        let to_copy = remaining.min(read);
        bytes.extend_from_slice(&chunk[..to_copy]);
        if to_copy < read {
            truncated = true;
        }
    }

    Ok(StreamCapture { bytes, truncated })
}

/// An external program invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Printable command line for logs.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
    pub elapsed_ms: u64,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, as the user would have seen them.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Runs `spec` to completion, killing it if `timeout` expires first.
///
/// A non-zero exit is not an error here; callers decide what it means.
///
/// # Errors
///
/// Returns `ShipError::ConfigError` if the program cannot be started,
/// `ShipError::Timeout` (tagged with `operation`) on expiry, and
/// `ShipError::IoError` if output capture fails.
pub async fn run_command(
    spec: &CommandSpec,
    operation: &str,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    debug!("Running {}", spec.display());
    let start = Instant::now();

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|err| {
        ShipError::ConfigError(format!("Failed to execute {}: {err}", spec.program))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ShipError::Internal(format!("Failed to capture {} stdout", spec.program)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ShipError::Internal(format!("Failed to capture {} stderr", spec.program)))?;

    let stdout_task =
        tokio::spawn(async move { capture_stream_limited(stdout, MAX_OUTPUT_CAPTURE_BYTES).await });
    let stderr_task =
        tokio::spawn(async move { capture_stream_limited(stderr, MAX_OUTPUT_CAPTURE_BYTES).await });

    let status = match timeout {
        Some(limit) => {
            if let Ok(wait_result) = tokio::time::timeout(limit, child.wait()).await {
                wait_result?
            } else {
                if let Err(err) = child.kill().await {
                    warn!(
                        "Failed to kill {} after timeout, it may still be running: {}",
                        spec.program, err
                    );
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(ShipError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }
        None => child.wait().await?,
    };

    let join_error =
        |err: tokio::task::JoinError| ShipError::Internal(format!("Output capture failed: {err}"));
    let stdout_capture = stdout_task.await.map_err(join_error)??;
    let stderr_capture = stderr_task.await.map_err(join_error)??;

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(
        "{} exited with {:?} after {}ms",
        spec.program,
        status.code(),
        elapsed_ms
    );

    Ok(CommandOutput {
        exit_code: status.code(),
        stdout: String::from_utf8_lossy(&stdout_capture.bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_capture.bytes).into_owned(),
        stdout_truncated: stdout_capture.truncated,
        stderr_truncated: stderr_capture.truncated,
        elapsed_ms,
    })
}
