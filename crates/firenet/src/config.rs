//! CLI configuration: thin wrapper around `firenet_config`.
//!
//! Adds profile resolution that respects `GlobalOpts` flag overrides
//! (--username, --base-url, --timeout).

use firenet_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use firenet_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Copy of `profile` with CLI flag overrides applied.
pub fn apply_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut resolved = profile.clone();
    if let Some(ref username) = global.username {
        resolved.username = Some(username.clone());
    }
    if let Some(ref base_url) = global.base_url {
        resolved.base_url.clone_from(base_url);
    }
    if let Some(timeout) = global.timeout {
        resolved.timeout = Some(timeout);
    }
    resolved
}

/// Build a `CoordinatorConfig` from the config file, profile, and CLI
/// overrides.
///
/// Without a stored profile, flags and `FIRENET_*` env vars alone are
/// enough as long as a username is given.
pub fn build_coordinator_config(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        None if global.username.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };

    let resolved = apply_overrides(&profile, global);
    Ok(firenet_config::profile_to_coordinator_config(
        &resolved,
        &profile_name,
        &cfg.defaults,
    )?)
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
