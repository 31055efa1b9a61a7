// Easy PV authentication
//
// Password login exchanges credentials for a bearer token; the token is then
// validated against the user-info endpoint. A token that fails validation
// is dropped so `is_logged_in()` never reports an unchecked session.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::client::{EasyPvClient, decode};
use crate::error::Error;
use crate::models::{LoginData, UserInfo};

impl EasyPvClient {
    /// Exchange account credentials for a session token.
    ///
    /// `POST /api/sys/v2/passLogin` with `{"num", "password"}`. The token is
    /// stored on the client; on failure the previous token is left untouched.
    pub async fn login_with_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let body = json!({
            "num": username,
            "password": password.expose_secret(),
        });

        let reply = self.post("api/sys/v2/passLogin", &body).await?;

        let token = reply
            .payload()
            .map(decode::<LoginData>)
            .transpose()?
            .and_then(|data| data.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Login {
                code: reply.code,
                details: reply.details(),
            })?;

        self.set_token(Some(SecretString::from(token)));
        info!("password login successful");
        Ok(())
    }

    /// Adopt a persisted token after checking it against the service.
    ///
    /// On any failure the token is cleared and the error returned as is.
    pub async fn login_with_token(&self, token: SecretString) -> Result<UserInfo, Error> {
        self.set_token(Some(token));

        match self.get_user_info().await {
            Ok(info) => {
                debug!("token validated");
                Ok(info)
            }
            Err(e) => {
                self.set_token(None);
                Err(e)
            }
        }
    }

    /// Forget the session token. The service has no logout endpoint.
    pub fn logout(&self) {
        self.set_token(None);
    }

    /// Fetch the account behind the current token.
    ///
    /// `GET /api/user/v2/selectUserInfo`. An empty payload or a rejected
    /// envelope is reported as [`Error::Login`].
    pub async fn get_user_info(&self) -> Result<UserInfo, Error> {
        let reply = self.get("api/user/v2/selectUserInfo", &[]).await?;

        match reply.payload() {
            Some(data) => decode(data),
            None => Err(Error::Login {
                code: reply.code,
                details: reply.details(),
            }),
        }
    }
}
