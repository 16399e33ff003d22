#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::{Result, ShipError};
use crate::types::{ACCOUNT_ID_KEY, CONTRACT_ID_KEY};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "ship.conf";
pub const DEFAULT_REMOTE_CLI: &str = "near";
pub const DEFAULT_CARGO: &str = "cargo";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_ARTIFACT_NAME: &str = "main.wasm";
pub const DEFAULT_LEDGER: &str = ".ship/deployments.json";
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 120_000;

const SETTING_KEYS: &[&str] = &[
    "network",
    "remote_cli",
    "cargo",
    "contract_dir",
    "out_dir",
    "artifact_name",
    "ledger",
    "remote_timeout_ms",
];

/// Deployment settings threaded explicitly through every operation.
///
/// Relative paths are resolved against the directory holding the config file,
/// so nothing depends on the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub network: Option<String>,
    pub remote_cli: String,
    pub cargo: String,
    pub contract_dir: PathBuf,
    pub out_dir: PathBuf,
    pub artifact_name: String,
    pub ledger_path: PathBuf,
    pub remote_timeout_ms: u64,
}

impl Settings {
    /// Defaults for a config file at `config_path`.
    #[must_use]
    pub fn with_defaults(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let root = project_root(&config_path);
        Self {
            network: None,
            remote_cli: DEFAULT_REMOTE_CLI.to_string(),
            cargo: DEFAULT_CARGO.to_string(),
            contract_dir: root.clone(),
            out_dir: root.join(DEFAULT_OUT_DIR),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            ledger_path: root.join(DEFAULT_LEDGER),
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            config_path,
        }
    }

    /// Where the packaged artifact lands.
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.out_dir.join(&self.artifact_name)
    }

    /// Lock file guarding the config file and output directory.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .config_path
            .file_name()
            .map_or_else(|| DEFAULT_CONFIG_FILE.into(), ToOwned::to_owned);
        name.push(".lock");
        self.config_path.with_file_name(name)
    }

    /// Applies overrides from the given variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::ConfigError` if `SHIP_REMOTE_TIMEOUT_MS` is not a number.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(network) = non_empty("SHIP_NETWORK") {
            self.network = Some(network);
        }
        if let Some(remote_cli) = non_empty("SHIP_REMOTE_CLI") {
            self.remote_cli = remote_cli;
        }
        if let Some(cargo) = non_empty("SHIP_CARGO") {
            self.cargo = cargo;
        }
        if let Some(timeout) = non_empty("SHIP_REMOTE_TIMEOUT_MS") {
            self.remote_timeout_ms = parse_timeout(&timeout)?;
        }
        Ok(self)
    }
}

/// Loads settings from the config file, then applies environment overrides.
///
/// A missing config file yields defaults; the identity prologue is read
/// separately by `ConfigStore`.
///
/// # Errors
///
/// Returns `ShipError::ConfigError` if the file exists but cannot be read or
/// holds an invalid value.
pub async fn load_settings(config_path: &Path) -> Result<Settings> {
    let base = if config_path.exists() {
        let content = tokio::fs::read_to_string(config_path)
            .await
            .map_err(|e| ShipError::ConfigError(format!("Failed to read config: {e}")))?;
        parse_config_content(config_path, &content)?
    } else {
        debug!(
            "No config at {}, using defaults",
            config_path.display()
        );
        Settings::with_defaults(config_path)
    };

    base.apply_env_overrides(|name| std::env::var(name).ok())
}

/// Parses the settings lines of a config file.
///
/// # Errors
///
/// Returns `ShipError::ConfigError` for an unparseable timeout.
pub fn parse_config_content(config_path: &Path, content: &str) -> Result<Settings> {
    let mut settings = Settings::with_defaults(config_path);
    let root = project_root(config_path);

    for line in content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
    {
        let Some((key, raw_value)) = split_key_value(line) else {
            warn!("Ignoring config line without '=': {line}");
            continue;
        };
        let value = expand_env_vars(raw_value);

        match key {
            ACCOUNT_ID_KEY | CONTRACT_ID_KEY => {}
            "network" => settings.network = Some(value).filter(|v| !v.is_empty()),
            "remote_cli" => settings.remote_cli = value,
            "cargo" => settings.cargo = value,
            "contract_dir" => settings.contract_dir = root.join(value),
            "out_dir" => settings.out_dir = root.join(value),
            "artifact_name" => settings.artifact_name = value,
            "ledger" => settings.ledger_path = root.join(value),
            "remote_timeout_ms" => settings.remote_timeout_ms = parse_timeout(&value)?,
            unknown => match suggest_key(unknown) {
                Some(suggestion) => {
                    warn!("Unknown config key '{unknown}', did you mean '{suggestion}'?");
                }
                None => warn!("Unknown config key '{unknown}'"),
            },
        }
    }

    Ok(settings)
}

fn parse_timeout(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .ok_or_else(|| {
            ShipError::ConfigError(format!(
                "remote_timeout_ms must be a positive integer, got '{raw}'"
            ))
        })
}

fn project_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn suggest_key(typo: &str) -> Option<&'static str> {
    SETTING_KEYS
        .iter()
        .chain([ACCOUNT_ID_KEY, CONTRACT_ID_KEY].iter())
        .map(|key| (*key, strsim::levenshtein(typo, key)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(key, _)| key)
}

fn expand_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_part = &result[start + 2..start + end];
            let (var_name, default) = var_part.split_once(":-").unwrap_or((var_part, ""));
            let value = std::env::var(var_name).unwrap_or_else(|_| default.to_string());
            result.replace_range(start..=(start + end), &value);
        } else {
            break;
        }
    }
    result
}

/// Splits `key = value`, trimming whitespace and surrounding quotes.
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
        .map(|(lhs, rhs)| (lhs.trim(), rhs.trim().trim_matches('"')))
}
