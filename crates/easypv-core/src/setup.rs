// ── Account setup ──
//
// Exchanges a username and password for a session token once, and
// classifies failures into the three outcomes an interactive setup
// flow shows the user.

use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, error};

use easypv_api::EasyPvClient;

/// What a successful setup persists. The password is never kept.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// Display title, the account's user name.
    pub title: String,
    pub email: Option<String>,
    pub token: SecretString,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Cannot connect to the Easy PV service")]
    CannotConnect {
        #[source]
        source: easypv_api::Error,
    },

    #[error("Invalid username or password")]
    InvalidAuth {
        #[source]
        source: easypv_api::Error,
    },

    #[error("Unexpected error during setup: {message}")]
    Unknown { message: String },
}

/// Log in with credentials and read back the account details.
///
/// Login rejection is [`SetupError::InvalidAuth`]; any other login failure
/// is [`SetupError::CannotConnect`]. A failure after a successful login
/// is [`SetupError::Unknown`].
pub async fn validate_login(
    client: &EasyPvClient,
    username: &str,
    password: &SecretString,
) -> Result<AccountInfo, SetupError> {
    if let Err(e) = client.login_with_password(username, password).await {
        return Err(if e.is_login() {
            debug!(error = %e, "credentials rejected");
            SetupError::InvalidAuth { source: e }
        } else {
            debug!(error = %e, "login request failed");
            SetupError::CannotConnect { source: e }
        });
    }

    let user = client.get_user_info().await.map_err(|e| {
        error!(error = ?e, "unexpected failure reading account details");
        SetupError::Unknown {
            message: e.to_string(),
        }
    })?;

    let token = client.token().ok_or_else(|| SetupError::Unknown {
        message: "login succeeded without a token".into(),
    })?;

    Ok(AccountInfo {
        title: user.user_name.unwrap_or_else(|| username.to_owned()),
        email: user.email,
        token,
    })
}
