//! Forget the stored session token.

use tracing::debug;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    let from_keyring = easypv_config::delete_token(&profile_name).unwrap_or_else(|e| {
        debug!(error = %e, "keyring unavailable");
        false
    });

    let from_file = match cfg.profiles.get_mut(&profile_name) {
        Some(profile) => profile.token.take().is_some(),
        None => false,
    };
    if from_file {
        config::save_config(&cfg)?;
    }

    if !global.quiet {
        if from_keyring || from_file {
            eprintln!("Logged out of profile '{profile_name}'");
        } else {
            eprintln!("No stored token for profile '{profile_name}'");
        }
    }
    Ok(())
}
