// Shared transport configuration for building reqwest::Client instances.
//
// The Easy PV service identifies the mobile app through a fixed header set.
// Those headers are baked into the client as defaults so every request
// carries them without the endpoint code repeating itself.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// App identity the service expects on every call.
pub const APP_HEADERS: [(&str, &str); 4] = [
    ("app", "EasyPV"),
    ("app-type", "1"),
    ("app-version", "2.4.0"),
    ("content-language", "en_US"),
];

/// User agent sent alongside [`APP_HEADERS`].
pub const USER_AGENT: &str = "Easy PV/2.4.0";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request socket timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` carrying the app header set.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// `extra` wins over the app header set on conflicts.
    pub fn build_client_with_headers(&self, extra: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in APP_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        headers.extend(extra);

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(Error::Transport)
    }
}
