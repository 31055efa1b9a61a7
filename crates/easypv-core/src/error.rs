// ── Core error types ──
//
// Errors surfaced by the coordinator and its helpers. Consumers never match
// on HTTP details: the `From<easypv_api::Error>` impl folds transport and
// envelope failures into the two classes the refresh loop cares about,
// authentication-fatal and transient.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The stored token is no longer accepted. Scheduling is paused until
    /// the owner re-authenticates.
    #[error("Re-authentication required: {message}")]
    ReauthRequired { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach the Easy PV service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Refresh timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Initial token validation failed for a non-auth reason; retryable.
    #[error("Setup failed: {message}")]
    SetupFailed { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Error fetching devices for station {station_id}: {source}")]
    StationFetch {
        station_id: String,
        #[source]
        source: easypv_api::Error,
    },

    #[error("API error: {message}")]
    Api { message: String, code: Option<i64> },

    #[error("Invalid data from API: {message}")]
    InvalidData { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Coordinator has not completed its first refresh")]
    NotInitialized,

    #[error("Coordinator stopped")]
    Stopped,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if retrying on schedule cannot help: new credentials
    /// are needed.
    pub fn is_auth_fatal(&self) -> bool {
        match self {
            Self::AuthenticationFailed { .. } | Self::ReauthRequired { .. } => true,
            Self::StationFetch { source, .. } => source.is_login(),
            _ => false,
        }
    }

    /// Returns `true` if the next scheduled refresh may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::SetupFailed { .. }
            | Self::Api { .. }
            | Self::InvalidData { .. } => true,
            Self::StationFetch { source, .. } => !source.is_login(),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<easypv_api::Error> for CoreError {
    fn from(err: easypv_api::Error) -> Self {
        match err {
            easypv_api::Error::Login { .. } => CoreError::AuthenticationFailed {
                message: err.to_string(),
            },
            easypv_api::Error::Api { code, .. } => CoreError::Api {
                message: err.to_string(),
                code: Some(code),
            },
            easypv_api::Error::InvalidResponse { status } => CoreError::Api {
                message: format!("{err} (HTTP {status})"),
                code: None,
            },
            easypv_api::Error::Transport(ref e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            easypv_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidData { message }
            }
            easypv_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            easypv_api::Error::InvalidHeader(e) => CoreError::Config {
                message: format!("Token cannot be sent as a header: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejection_is_auth_fatal() {
        let err = CoreError::from(easypv_api::Error::Login {
            code: 401,
            details: "expired".into(),
        });
        assert!(err.is_auth_fatal());
        assert!(!err.is_transient());
    }

    #[test]
    fn station_wrapper_keeps_the_inner_classification() {
        let wrapped = CoreError::StationFetch {
            station_id: "S1".into(),
            source: easypv_api::Error::Api {
                message: "Failed to get devices".into(),
                code: 500,
                details: "busy".into(),
            },
        };
        assert!(wrapped.is_transient());
        assert_eq!(
            wrapped.to_string(),
            "Error fetching devices for station S1: Failed to get devices: [500] busy"
        );

        let wrapped_login = CoreError::StationFetch {
            station_id: "S1".into(),
            source: easypv_api::Error::Login {
                code: 401,
                details: String::new(),
            },
        };
        assert!(wrapped_login.is_auth_fatal());
    }

    #[test]
    fn bad_status_maps_to_transient_api_error() {
        let err = CoreError::from(easypv_api::Error::InvalidResponse { status: 503 });
        assert!(matches!(err, CoreError::Api { code: None, .. }));
        assert!(err.is_transient());
    }
}
