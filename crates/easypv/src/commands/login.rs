//! Account setup: exchange credentials for a session token and persist it.

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use easypv_core::validate_login;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;

use super::util;

pub async fn handle(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    let username = match args.username {
        Some(u) => u,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(util::prompt_error)?,
    };
    let password = match args.password {
        Some(p) => SecretString::from(p),
        None => SecretString::from(rpassword::prompt_password("Password: ")?),
    };

    let client = config::build_client(global, &cfg, cfg.profiles.get(&profile_name))?;
    let account = validate_login(&client, &username, &password).await?;

    let profile = cfg.profiles.entry(profile_name.clone()).or_default();
    profile.title = Some(account.title.clone());
    profile.email.clone_from(&account.email);
    if let Some(ref url) = global.base_url {
        profile.base_url = Some(url.clone());
    }

    profile.token = if args.no_keyring {
        Some(account.token.expose_secret().to_owned())
    } else {
        match easypv_config::store_token(&profile_name, &account.token) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "keyring unavailable, storing the token in the config file");
                Some(account.token.expose_secret().to_owned())
            }
        }
    };

    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "Logged in as {} (profile '{profile_name}', saved to {})",
            account.title,
            config::config_path().display()
        );
    }
    Ok(())
}
