//! `GlobalOpts`-aware wrappers around `easypv-config`.
//!
//! Flags win over the profile, the profile wins over `[defaults]`.

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use easypv_config::{Config, Profile};
use easypv_core::{CoordinatorConfig, CoreError, EasyPvClient, TransportConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use easypv_config::{config_path, load_config_or_default, save_config};

/// Profile selected by `--profile`, else the configured default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.profile_name(global.profile.as_deref())
}

pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Client for the base URL and timeout in effect.
pub fn build_client(
    global: &GlobalOpts,
    cfg: &Config,
    profile: Option<&Profile>,
) -> Result<EasyPvClient, CliError> {
    let profile_url = match profile {
        Some(p) => easypv_config::profile_base_url(p)?,
        None => None,
    };

    let timeout = global
        .timeout
        .or_else(|| profile.and_then(|p| p.timeout))
        .unwrap_or(cfg.defaults.timeout);
    let transport = TransportConfig::default().with_timeout(Duration::from_secs(timeout));

    let client = match global.base_url.as_deref().or(profile_url.as_deref()) {
        Some(url) => EasyPvClient::new(url, &transport),
        None => EasyPvClient::production(&transport),
    };
    client.map_err(|e| CliError::from(CoreError::from(e)))
}

/// Coordinator settings; `--token` skips the profile's token chain.
pub fn coordinator_config(
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
    profile: Option<&Profile>,
) -> Result<CoordinatorConfig, CliError> {
    if let Some(ref token) = global.token {
        let interval = easypv_config::refresh_interval(profile, &cfg.defaults)?;
        return Ok(CoordinatorConfig::new(SecretString::from(token.clone()))
            .with_refresh_interval(interval)
            .with_refresh_timeout(Duration::from_secs(cfg.defaults.refresh_timeout)));
    }

    let profile = profile.ok_or_else(|| CliError::NoToken {
        profile: profile_name.into(),
    })?;
    Ok(easypv_config::profile_to_coordinator_config(
        profile,
        profile_name,
        &cfg.defaults,
    )?)
}

/// Everything a data command needs.
pub struct Session {
    pub client: EasyPvClient,
    pub coordinator: CoordinatorConfig,
    pub format: OutputFormat,
}

pub fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);

    Ok(Session {
        client: build_client(global, &cfg, profile)?,
        coordinator: coordinator_config(global, &cfg, &profile_name, profile)?,
        format: output_format(global, &cfg),
    })
}
