//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `SetupError` and `ConfigError` into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use easypv_config::ConfigError;
use easypv_core::{CoreError, SetupError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Easy PV service")]
    #[diagnostic(
        code(easypv::connection_failed),
        help(
            "Check your network connection.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Invalid username or password")]
    #[diagnostic(
        code(easypv::invalid_credentials),
        help("Check the account name and password you use in the Easy PV app.")
    )]
    InvalidCredentials,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(easypv::auth_failed),
        help("The stored session token was rejected. Run: easypv login")
    )]
    AuthFailed { message: String },

    #[error("No session token for profile '{profile}'")]
    #[diagnostic(
        code(easypv::no_token),
        help(
            "Log in with: easypv login --profile {profile}\n\
             Or pass --token / set EASYPV_TOKEN."
        )
    )]
    NoToken { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(easypv::not_found),
        help("Run: easypv {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(easypv::api_error))]
    ApiError { code: String, message: String },

    #[error("Setup failed: {message}")]
    #[diagnostic(
        code(easypv::setup_failed),
        help("Re-run with -vv for details.")
    )]
    SetupFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(easypv::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {source}")]
    #[diagnostic(
        code(easypv::config),
        help("Check the config file at: {path}")
    )]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Refresh timed out after {seconds}s")]
    #[diagnostic(
        code(easypv::timeout),
        help("Increase the timeout with --timeout or retry later.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(easypv::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(easypv::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::InvalidCredentials | Self::AuthFailed { .. } | Self::NoToken { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config { source, .. } => match source {
                ConfigError::NoToken { .. } => exit_code::AUTH,
                ConfigError::Validation { .. } => exit_code::USAGE,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(source: ConfigError) -> Self {
        match source {
            ConfigError::NoToken { profile } => Self::NoToken { profile },
            source => Self::Config {
                source,
                path: easypv_config::config_path().display().to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } | CoreError::ReauthRequired { message } => {
                CliError::AuthFailed { message }
            }

            CoreError::ConnectionFailed { reason } | CoreError::SetupFailed { message: reason } => {
                CliError::ConnectionFailed { reason }
            }

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            err @ CoreError::StationFetch { .. } => {
                let message = err.to_string();
                if err.is_auth_fatal() {
                    CliError::AuthFailed { message }
                } else {
                    CliError::ApiError {
                        code: "station".into(),
                        message,
                    }
                }
            }

            CoreError::Api { message, code } => CliError::ApiError {
                code: code.map_or_else(|| "http".into(), |c| c.to_string()),
                message,
            },

            CoreError::InvalidData { message } => CliError::ApiError {
                code: "invalid_data".into(),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ (CoreError::NotInitialized | CoreError::Stopped) => CliError::ApiError {
                code: "internal".into(),
                message: err.to_string(),
            },
        }
    }
}

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::CannotConnect { source } => CliError::ConnectionFailed {
                reason: source.to_string(),
            },
            SetupError::InvalidAuth { .. } => CliError::InvalidCredentials,
            SetupError::Unknown { message } => CliError::SetupFailed { message },
        }
    }
}
