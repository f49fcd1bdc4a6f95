//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use spark_config::ConfigError;
use spark_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const NO_CACHE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device cache ─────────────────────────────────────────────────

    #[error("No devices have been added. Please use 'spark add' first.")]
    #[diagnostic(
        code(spark::no_devices),
        help("Run: spark add <token>\nExpected cache at: {path}")
    )]
    NoDevices { path: String },

    #[error("Device '{identifier}' is not in the device cache")]
    #[diagnostic(
        code(spark::unknown_device),
        help("Register it with: spark add <token> [id]")
    )]
    UnknownDevice { identifier: String },

    #[error("Device cache error at {path}: {message}")]
    #[diagnostic(code(spark::cache))]
    Cache { path: String, message: String },

    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the spark Cloud")]
    #[diagnostic(
        code(spark::connection_failed),
        help("Check your network connection, or --api-url if you set one.\n{reason}")
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(spark::auth_failed),
        help("Check the access token, then register it again with: spark add <token>")
    )]
    AuthFailed { message: String },

    // ── Devices & capabilities ───────────────────────────────────────

    #[error("Device '{identifier}' was not found")]
    #[diagnostic(
        code(spark::not_found),
        help("The device may have been released from this token.")
    )]
    DeviceNotFound { identifier: String },

    #[error("The function you've tried to call is not registered with the spark Cloud")]
    #[diagnostic(
        code(spark::unknown_function),
        help("Run: spark fn {device} to see available functions")
    )]
    UnknownFunction { device: String, name: String },

    #[error("The variable you've tried to get is not registered with the spark Cloud")]
    #[diagnostic(
        code(spark::unknown_variable),
        help("Run: spark var {device} to see available variables")
    )]
    UnknownVariable { device: String, name: String },

    #[error("Device {device} could not be connected: {reason}")]
    #[diagnostic(code(spark::session_failed))]
    SessionFailed { device: String, reason: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(spark::api_error))]
    ApiError { message: String },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(spark::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(spark::config))]
    Config(#[from] ConfigError),

    // ── Serialization ────────────────────────────────────────────────

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(spark::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoDevices { .. } => exit_code::NO_CACHE,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::UnknownDevice { .. }
            | Self::DeviceNotFound { .. }
            | Self::UnknownFunction { .. }
            | Self::UnknownVariable { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => CliError::AuthFailed { message },

            CoreError::DeviceNotFound { id } => CliError::DeviceNotFound { identifier: id },

            CoreError::Transport { reason } => CliError::ConnectionFailed { reason },

            CoreError::UnknownFunction { device, name } => {
                CliError::UnknownFunction { device, name }
            }

            CoreError::UnknownVariable { device, name } => {
                CliError::UnknownVariable { device, name }
            }

            CoreError::RemoteRead { source, .. } | CoreError::RemoteExecution { source, .. } => {
                if source.is_auth_error() {
                    CliError::AuthFailed {
                        message: source.to_string(),
                    }
                } else if source.is_transport() {
                    CliError::ConnectionFailed {
                        reason: source.to_string(),
                    }
                } else {
                    CliError::ApiError {
                        message: source.to_string(),
                    }
                }
            }

            CoreError::SessionFailed { id, reason } => CliError::SessionFailed {
                device: id,
                reason,
            },

            CoreError::NotReady { id } | CoreError::SessionClosed { id } => {
                CliError::SessionFailed {
                    device: id,
                    reason: "session is not connected".into(),
                }
            }

            CoreError::Cache { path, message } => CliError::Cache { path, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }
        }
    }
}
