//! Shared configuration for the Easy PV tools.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `easypv_core::CoordinatorConfig`. Account passwords are
//! never stored: `easypv login` exchanges them for a token once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use easypv_core::{CoordinatorConfig, TransportConfig};

/// Keyring service name; entries are keyed `{profile}/token`.
pub const KEYRING_SERVICE: &str = "easypv";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "EASYPV_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured for profile '{profile}'")]
    NoToken { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile name to use: the explicit one, else the configured
    /// default, else `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Seconds between scheduled refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Deadline for one whole refresh cycle, in seconds.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout: u64,

    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
            refresh_timeout: default_refresh_timeout(),
            output: default_output(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    60
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_timeout() -> u64 {
    20
}
fn default_output() -> String {
    "table".into()
}

/// One Easy PV account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account user name, shown as the profile title.
    pub title: Option<String>,

    pub email: Option<String>,

    /// Session token (plaintext; the keyring is preferred).
    pub token: Option<String>,

    /// Environment variable holding the session token.
    pub token_env: Option<String>,

    /// Service base URL; the production endpoint when unset.
    pub base_url: Option<String>,

    /// Override `defaults.refresh_interval`.
    pub refresh_interval: Option<u64>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// `$EASYPV_CONFIG`, else `{config_dir}/easypv/config.toml`.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("", "", "easypv").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("easypv");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` merged with `EASYPV_` variables
/// (`EASYPV_DEFAULTS__TIMEOUT=10`). A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EASYPV_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Token storage ───────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
}

/// Resolve the session token: `token_env` variable, then the system
/// keyring, then the plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken {
        profile: profile_name.into(),
    })
}

/// Save a token in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

/// Remove the keyring token. Returns `false` if there was none.
pub fn delete_token(profile_name: &str) -> Result<bool, ConfigError> {
    match keyring_entry(profile_name)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// The profile's base URL, validated; `None` means production.
pub fn profile_base_url(profile: &Profile) -> Result<Option<String>, ConfigError> {
    let Some(ref raw) = profile.base_url else {
        return Ok(None);
    };

    let url = url::Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("{raw}: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(Some(url.to_string()))
}

pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    TransportConfig::default()
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)))
}

/// Poll interval for a profile, falling back to `[defaults]`. Zero is
/// rejected since it would disable polling.
pub fn refresh_interval(
    profile: Option<&Profile>,
    defaults: &Defaults,
) -> Result<Duration, ConfigError> {
    let secs = profile
        .and_then(|p| p.refresh_interval)
        .unwrap_or(defaults.refresh_interval);
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: "refresh_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Build a `CoordinatorConfig` from a profile with no CLI overrides.
pub fn profile_to_coordinator_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<CoordinatorConfig, ConfigError> {
    let interval = refresh_interval(Some(profile), defaults)?;
    let token = resolve_token(profile, profile_name)?;

    Ok(CoordinatorConfig::new(token)
        .with_refresh_interval(interval)
        .with_refresh_timeout(Duration::from_secs(defaults.refresh_timeout)))
}
