#![allow(dead_code)]

pub mod fakes;

use ship::config::Settings;
use std::path::Path;

pub const ACCOUNT: &str = "alice.testnet";
pub const CONTRACT: &str = "app.alice.testnet";

/// Settings rooted in `dir` with the identity prologue already written.
pub fn bound_project(dir: &Path) -> Result<Settings, String> {
    let config_path = dir.join("ship.conf");
    std::fs::write(
        &config_path,
        format!("accountId = {ACCOUNT}\ncontractId = {CONTRACT}\n# settings\nnetwork = testnet\n"),
    )
    .map_err(|err| format!("failed to write config: {err}"))?;
    Ok(Settings::with_defaults(config_path))
}
