use thiserror::Error;

/// Top-level error type for the `easypv-api` crate.
///
/// Two layers of failure are distinguished: the HTTP layer (an unexpected
/// status, a broken socket, a body that is not an envelope) and the
/// application layer (an envelope whose `code` is not a success).
/// `easypv-core` classifies these into fatal and transient failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Application ─────────────────────────────────────────────────
    /// The service answered but rejected the request or returned no data.
    #[error("{message}: [{code}] {details}")]
    Api {
        message: String,
        code: i64,
        details: String,
    },

    /// Credentials or token rejected. A specialised [`Error::Api`].
    #[error("Login failed: [{code}] {details}")]
    Login { code: i64, details: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP status other than 200.
    #[error("Invalid response from API")]
    InvalidResponse { status: u16 },

    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (usually the bearer token) cannot be sent.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Shorthand for an application rejection with a fixed summary.
    pub(crate) fn api(message: &str, code: i64, details: impl Into<String>) -> Self {
        Self::Api {
            message: message.to_owned(),
            code,
            details: details.into(),
        }
    }

    /// Returns `true` if the credentials or the session token were rejected.
    pub fn is_login(&self) -> bool {
        matches!(self, Self::Login { .. })
    }

    /// Returns `true` for application-level rejections, login included.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Login { .. })
    }

    /// Returns `true` if the next scheduled attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::InvalidResponse { .. }
                | Self::Transport(_)
                | Self::Deserialization { .. }
        )
    }

    /// The application error code, if the service returned one.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } | Self::Login { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_service_wording() {
        let err = Error::api("Failed to get stations", 500, "busy");
        assert_eq!(err.to_string(), "Failed to get stations: [500] busy");

        let err = Error::Login {
            code: 401,
            details: "token expired".into(),
        };
        assert_eq!(err.to_string(), "Login failed: [401] token expired");

        let err = Error::InvalidResponse { status: 502 };
        assert_eq!(err.to_string(), "Invalid response from API");
    }

    #[test]
    fn login_is_an_api_error_but_not_transient() {
        let err = Error::Login {
            code: 401,
            details: String::new(),
        };
        assert!(err.is_login());
        assert!(err.is_api());
        assert!(!err.is_transient());
        assert_eq!(err.api_code(), Some(401));
    }

    #[test]
    fn rejections_and_bad_status_are_transient() {
        assert!(Error::api("Failed to get devices", 500, "").is_transient());
        assert!(Error::InvalidResponse { status: 503 }.is_transient());
        assert!(!Error::InvalidResponse { status: 503 }.is_api());
    }
}
