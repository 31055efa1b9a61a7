// Easy PV HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer-token handling and
// envelope decoding. Endpoint groups (auth, stations) are implemented as
// inherent methods in separate files to keep this module focused on
// transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ApiResponse;
use crate::transport::TransportConfig;

/// Production endpoint of the Easy PV app backend.
pub const DEFAULT_BASE_URL: &str = "https://inverter-en.easycharging-tech.com/prod-api";

/// Async client for the Easy PV cloud API.
///
/// Holds at most one session token. The token is written only by the
/// login/logout methods and read by every authenticated request. The
/// client never retries: each method performs exactly one HTTP call.
pub struct EasyPvClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl EasyPvClient {
    /// Create a client against `base_url` using the given transport settings.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a client against the production service.
    pub fn production(transport: &TransportConfig) -> Result<Self, Error> {
        Self::new(DEFAULT_BASE_URL, transport)
    }

    /// Wrap an existing `reqwest::Client` (caller manages default headers).
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        let path = base_url.path().trim_end_matches('/').to_owned();
        base_url.set_path(&format!("{path}/"));

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// The service base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Token state ──────────────────────────────────────────────────

    /// Whether a token is currently held. Says nothing about its validity.
    pub fn is_logged_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// A copy of the current token, for persistence.
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_token(&self, token: Option<SecretString>) {
        debug!(present = token.is_some(), "updating session token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn bearer(&self) -> Result<Option<HeaderValue>, Error> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        let Some(token) = guard.as_ref() else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative API path (e.g. `"api/user/v2/selectUserInfo"`).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET returning the raw envelope.
    pub(crate) async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url.path());

        let mut request = self.http.get(url).query(query);
        if let Some(bearer) = self.bearer()? {
            request = request.header(AUTHORIZATION, bearer);
        }

        let resp = request.send().await?;
        parse_envelope(resp).await
    }

    /// Unauthenticated POST with a JSON body returning the raw envelope.
    pub(crate) async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url.path());

        let resp = self.http.post(url).json(body).send().await?;
        parse_envelope(resp).await
    }
}

/// Reject any status but 200, then decode the `{ code, msg, data }` envelope.
async fn parse_envelope(resp: reqwest::Response) -> Result<ApiResponse, Error> {
    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        debug!(status = status.as_u16(), "unexpected HTTP status");
        return Err(Error::InvalidResponse {
            status: status.as_u16(),
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Decode a payload fragment into a typed record.
pub(crate) fn decode<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash_and_keeps_prefix() {
        let client =
            EasyPvClient::with_client(reqwest::Client::new(), "https://example.com/prod-api")
                .unwrap();
        assert_eq!(client.base_url().as_str(), "https://example.com/prod-api/");
        assert_eq!(
            client.url("/api/sys/v2/passLogin").unwrap().as_str(),
            "https://example.com/prod-api/api/sys/v2/passLogin"
        );
    }

    #[test]
    fn token_presence_drives_logged_in() {
        let client = EasyPvClient::with_client(reqwest::Client::new(), DEFAULT_BASE_URL).unwrap();
        assert!(!client.is_logged_in());
        assert!(client.bearer().unwrap().is_none());

        client.set_token(Some(SecretString::from("T1".to_owned())));
        assert!(client.is_logged_in());
        let bearer = client.bearer().unwrap().unwrap();
        assert!(bearer.is_sensitive());
        assert_eq!(bearer.to_str().unwrap(), "Bearer T1");

        client.set_token(None);
        assert!(!client.is_logged_in());
    }
}
