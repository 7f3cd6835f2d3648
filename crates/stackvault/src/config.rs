//! CLI configuration: thin wrapper around `stackvault_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --api-key, etc.).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use stackvault_core::{BackupConfig, FailurePolicy, RetentionPolicy, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use stackvault_config::{
    Config, Defaults, Profile, config_path, default_output_dir, load_config, save_config,
};

/// Per-command flags layered over the profile.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub output_dir: Option<PathBuf>,
    pub backup_password: Option<String>,
    pub cleanup: bool,
    pub retention_days: Option<u32>,
    pub concurrency: Option<usize>,
    pub require_platform_backup: bool,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Look up the active profile, or synthesize one from `--url` when no
/// profile exists. An explicitly requested profile must exist.
fn effective_profile(global: &GlobalOpts, cfg: &Config, name: &str) -> Result<Profile, CliError> {
    if let Some(profile) = cfg.profiles.get(name) {
        let mut profile = profile.clone();
        if let Some(ref url) = global.url {
            profile.url.clone_from(url);
        }
        return Ok(profile);
    }

    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: name.into(),
            available: available_profiles(cfg),
        });
    }

    let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    Ok(Profile {
        url,
        ..Profile::default()
    })
}

/// Build a `BackupConfig` from the config file, profile, and CLI overrides.
///
/// Precedence: flag > env > profile > `[defaults]`.
pub fn resolve_backup_config(
    global: &GlobalOpts,
    overrides: &RunOverrides,
) -> Result<(BackupConfig, String), CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);
    let profile = effective_profile(global, &cfg, &profile_name)?;

    // 1. Credentials: flag / STACKVAULT_API_KEY short-circuit the chain
    let flag_key = global.api_key.clone().map(SecretString::from);
    let mut bc = stackvault_config::profile_to_backup_config(
        &profile,
        &profile_name,
        &cfg.defaults,
        flag_key,
    )?;

    // 2. Transport
    if global.insecure {
        bc.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        bc.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = global.connect_timeout {
        bc.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = global.retries {
        bc.retry.max_retries = retries;
    }
    if let Some(secs) = global.retry_delay {
        bc.retry.delay = Duration::from_secs(secs);
    }
    if global.retry_all_errors {
        bc.retry.retry_all_errors = true;
    }

    // 3. Run options
    if let Some(ref dir) = overrides.output_dir {
        bc.output_dir.clone_from(dir);
    }
    if let Some(ref pw) = overrides.backup_password {
        bc.backup_password = Some(SecretString::from(pw.clone()));
    }
    if overrides.cleanup || bc.retention.is_some() {
        let days = overrides
            .retention_days
            .or(profile.retention_days)
            .unwrap_or(cfg.defaults.retention_days);
        bc.retention = Some(stackvault_config::retention_policy(days)?);
    }
    if let Some(n) = overrides.concurrency {
        bc.concurrency = n;
    }
    if overrides.require_platform_backup {
        bc.failure_policy = FailurePolicy::strict();
    }

    Ok((bc, profile_name))
}

/// Where `clean` looks, how old is too old, and the profile that said so.
#[derive(Debug)]
pub struct RetentionScope {
    pub root: PathBuf,
    pub policy: RetentionPolicy,
    pub profile: String,
}

/// Retention settings for `clean`; flags win over the profile, then defaults.
pub fn resolve_retention(
    global: &GlobalOpts,
    output_dir: Option<PathBuf>,
    retention_days: Option<u32>,
) -> Result<RetentionScope, CliError> {
    retention_scope(&load_config()?, global, output_dir, retention_days)
}

fn retention_scope(
    cfg: &Config,
    global: &GlobalOpts,
    output_dir: Option<PathBuf>,
    retention_days: Option<u32>,
) -> Result<RetentionScope, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    let root = output_dir
        .or_else(|| profile.and_then(|p| p.output_dir.clone()))
        .unwrap_or_else(default_output_dir);
    let days = retention_days
        .or_else(|| profile.and_then(|p| p.retention_days))
        .unwrap_or(cfg.defaults.retention_days);

    Ok(RetentionScope {
        root,
        policy: stackvault_config::retention_policy(days)?,
        profile: profile_name,
    })
}
