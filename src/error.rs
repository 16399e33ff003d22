#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use std::fmt;
use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const MISSING: &str = "MISSING";
    pub const INVALID: &str = "INVALID";
    pub const BUILD: &str = "BUILD";
    pub const REJECTED: &str = "REJECTED";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const UNCONFIRMED: &str = "UNCONFIRMED";
    pub const BUSY: &str = "BUSY";
    pub const CONFIG: &str = "CONFIG";
    pub const IO: &str = "IO";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Stage of the build pipeline that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Testing,
    Compiling,
    Packaging,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testing => write!(f, "testing"),
            Self::Compiling => write!(f, "compiling"),
            Self::Packaging => write!(f, "packaging"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShipError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Missing required field: amount")]
    MissingAmount,

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Build failed while {stage}:\n{output}")]
    BuildFailure { stage: FailedStage, output: String },

    #[error("Remote {operation} rejected (exit code {exit_code:?}): {detail}")]
    RemoteRejected {
        operation: String,
        exit_code: Option<i32>,
        detail: String,
    },

    #[error("Remote {operation} timed out after {timeout_ms}ms; outcome unknown, check remote state before retrying")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Remote {operation} outcome unconfirmed: {detail}")]
    Unconfirmed { operation: String, detail: String },

    #[error("Project is locked by another run: {path}")]
    Busy { path: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShipError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } | Self::MissingAmount => code::MISSING,
            Self::InvalidField { .. } | Self::SerializationError(_) => code::INVALID,
            Self::BuildFailure { .. } => code::BUILD,
            Self::RemoteRejected { .. } => code::REJECTED,
            Self::Timeout { .. } => code::TIMEOUT,
            Self::Unconfirmed { .. } => code::UNCONFIRMED,
            Self::Busy { .. } => code::BUSY,
            Self::ConfigError(_) => code::CONFIG,
            Self::IoError(_) => code::IO,
            Self::Internal(_) => code::INTERNAL,
        }
    }

    /// Returns the process exit code for this error. Zero is never returned.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingField { .. } | Self::MissingAmount | Self::InvalidField { .. } => 2,
            Self::ConfigError(_) => 3,
            Self::BuildFailure { .. } => 4,
            Self::RemoteRejected { .. } => 5,
            Self::Timeout { .. } | Self::Unconfirmed { .. } => 6,
            Self::Busy { .. } => 7,
            Self::IoError(_) => 8,
            Self::SerializationError(_) => 9,
            Self::Internal(_) => 10,
        }
    }

    /// Whether the remote side may or may not have applied the operation.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unconfirmed { .. })
    }
}

/// Error codes with their description and suggested fix
pub const ERROR_CODES: &[(&str, &str, &str)] = &[
    (
        code::MISSING,
        "A required identity field or parameter is absent",
        "Run 'ship set --account-id <id> --contract-id <id>' or pass the named flag",
    ),
    (
        code::INVALID,
        "A parameter has an invalid value",
        "Check the named field; JSON arguments must parse",
    ),
    (
        code::BUILD,
        "Test or compile stage failed",
        "Fix the reported diagnostics and rebuild",
    ),
    (
        code::REJECTED,
        "The remote environment rejected the operation",
        "Inspect the remote tool output; retry only as an explicit new action",
    ),
    (
        code::TIMEOUT,
        "No response within the configured bound",
        "Run 'ship state' to reconcile before retrying",
    ),
    (
        code::UNCONFIRMED,
        "Remote tool reported success without a transaction id",
        "Run 'ship state' to reconcile, then 'ship deploy --force'",
    ),
    (
        code::BUSY,
        "Another run holds the project lock",
        "Wait for the other run; remove the lock file only if that process is gone",
    ),
    (
        code::CONFIG,
        "Configuration file could not be read or parsed",
        "Check ship.conf syntax",
    ),
    (
        code::IO,
        "Local filesystem operation failed",
        "Check permissions and free space",
    ),
    (
        code::INTERNAL,
        "Unexpected internal failure",
        "Inspect logs and retry command",
    ),
];

/// Get error code details (description and fix) for a given error code
#[must_use]
pub fn get_error_info(error_code: &str) -> Option<(&'static str, &'static str)> {
    ERROR_CODES
        .iter()
        .find(|(code, _, _)| *code == error_code)
        .map(|(_, desc, fix)| (*desc, *fix))
}

pub type Result<T> = std::result::Result<T, ShipError>;

#[cfg(test)]
mod tests {
    use super::{get_error_info, FailedStage, ShipError, ERROR_CODES};

    #[test]
    fn missing_field_message_names_the_field() {
        let err = ShipError::missing("contractId");
        assert_eq!(err.to_string(), "Missing required field: contractId");
        assert_eq!(ShipError::MissingAmount.to_string(), "Missing required field: amount");
    }

    #[test]
    fn every_code_has_documentation() {
        let samples = [
            ShipError::missing("x"),
            ShipError::invalid("x", "y"),
            ShipError::BuildFailure {
                stage: FailedStage::Testing,
                output: String::new(),
            },
            ShipError::Timeout {
                operation: "deploy".to_string(),
                timeout_ms: 1,
            },
            ShipError::Busy {
                path: "ship.conf.lock".to_string(),
            },
        ];
        for err in samples {
            assert!(get_error_info(err.code()).is_some(), "{}", err.code());
        }
        assert_eq!(ERROR_CODES.len(), 10);
    }

    #[test]
    fn only_timeouts_and_unconfirmed_are_ambiguous() {
        assert!(ShipError::Timeout {
            operation: "send".to_string(),
            timeout_ms: 5
        }
        .is_ambiguous());
        assert!(ShipError::Unconfirmed {
            operation: "deploy".to_string(),
            detail: String::new()
        }
        .is_ambiguous());
        assert!(!ShipError::RemoteRejected {
            operation: "deploy".to_string(),
            exit_code: Some(1),
            detail: String::new()
        }
        .is_ambiguous());
    }
}
