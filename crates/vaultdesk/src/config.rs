//! CLI configuration — thin wrapper around `vaultdesk_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --username, --insecure, --timeout).

use std::time::Duration;

use vaultdesk_core::{AuthCredentials, BackofficeConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use vaultdesk_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `BackofficeConfig` from the config file, the active profile
/// and CLI overrides. Flags win over profile values.
pub fn build_backoffice_config(global: &GlobalOpts) -> Result<BackofficeConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // A named profile must exist; the implicit default may be
        // replaced entirely by flags.
        None if global.profile.is_some() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::from_config(
                vaultdesk_config::ConfigError::UnknownProfile { name: profile_name },
                &names,
            ));
        }
        None => Profile::default(),
    };

    resolve_profile(&profile, &profile_name, cfg.defaults.timeout, global)
}

/// Translate a `Profile` + global flags into a `BackofficeConfig`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    default_timeout: u64,
    global: &GlobalOpts,
) -> Result<BackofficeConfig, CliError> {
    // 1. URL (flag > env > profile)
    let url_str = global.url.as_deref().unwrap_or(&profile.url);
    if url_str.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    let url = vaultdesk_config::parse_url(url_str).map_err(|e| CliError::from_config(e, &[]))?;

    // 2. Credentials (a --username flag replaces the profile's)
    let mut effective = profile.clone();
    if let Some(ref username) = global.username {
        effective.username = Some(username.clone());
    }
    let auth = vaultdesk_config::resolve_auth(&effective, profile_name)
        .map_err(|e| CliError::from_config(e, &[]))?;
    if let AuthCredentials::Credentials { ref username, .. } = auth {
        tracing::debug!(profile = profile_name, username, "resolved credentials");
    }

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        vaultdesk_config::tls_for(profile)
    };

    // 4. Timeout (flag > env > profile > [defaults])
    let timeout = global.timeout.or(profile.timeout).unwrap_or(default_timeout);

    let mut config = BackofficeConfig::new(url, auth);
    config.tls = tls;
    config.timeout = Duration::from_secs(timeout);
    Ok(config)
}
