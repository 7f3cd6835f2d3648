//! Configuration for the stackvault CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `stackvault_core::BackupConfig`. The CLI layers its
//! flag overrides on top of what this crate produces.

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

use stackvault_core::{
    BackupConfig, FailurePolicy, RetentionPolicy, RetryPolicy, TlsVerification,
};

/// Service name under which secrets live in the system keyring.
pub const KEYRING_SERVICE: &str = "stackvault";

/// Environment prefix for config overrides (`STACKVAULT_DEFAULTS__TIMEOUT=60`).
pub const ENV_PREFIX: &str = "STACKVAULT_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

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

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named platform profiles.
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

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Total per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds between retries.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            retention_days: default_retention_days(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    300
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    5
}
fn default_retention_days() -> u32 {
    30
}
fn default_concurrency() -> usize {
    1
}

/// A named platform profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Platform base URL (e.g., "https://portainer.local:9443").
    #[serde(default)]
    pub url: String,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Password for the platform export (plaintext, prefer keyring).
    pub backup_password: Option<String>,

    /// Environment variable name containing the export password.
    pub backup_password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Root of the dated backup directories.
    pub output_dir: Option<PathBuf>,

    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<u64>,
    pub retry_all_errors: Option<bool>,

    /// Remove old backups after each run.
    pub cleanup: Option<bool>,
    pub retention_days: Option<u32>,

    pub concurrency: Option<usize>,

    /// Abort the run when the platform export fails.
    pub require_platform_backup: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "stackvault", "stackvault").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Backup root used when neither a flag nor the profile names one.
pub fn default_output_dir() -> PathBuf {
    ProjectDirs::from("dev", "stackvault", "stackvault").map_or_else(
        || PathBuf::from("backups"),
        |dirs| dirs.data_dir().join("backups"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stackvault");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Nested keys use a double underscore: `STACKVAULT_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Keyring entry name for the profile's API key.
pub fn api_key_entry(profile_name: &str) -> String {
    format!("{profile_name}/api-key")
}

/// Keyring entry name for the profile's export password.
pub fn backup_password_entry(profile_name: &str) -> String {
    format!("{profile_name}/backup-password")
}

/// Store a secret under [`KEYRING_SERVICE`].
pub fn store_secret(entry_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, entry_name)?;
    entry.set_password(secret)?;
    Ok(())
}

fn keyring_secret(entry_name: &str) -> Option<SecretString> {
    keyring::Entry::new(KEYRING_SERVICE, entry_name)
        .and_then(|entry| entry.get_password())
        .ok()
        .map(SecretString::from)
}

fn env_secret(var: Option<&str>) -> Option<SecretString> {
    var.and_then(|name| std::env::var(name).ok())
        .filter(|val| !val.is_empty())
        .map(SecretString::from)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(secret) = env_secret(profile.api_key_env.as_deref()) {
        return Ok(secret);
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(&api_key_entry(profile_name)) {
        return Ok(secret);
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the optional export password. `None` means an unencrypted archive.
pub fn resolve_backup_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    env_secret(profile.backup_password_env.as_deref())
        .or_else(|| keyring_secret(&backup_password_entry(profile_name)))
        .or_else(|| {
            profile
                .backup_password
                .as_ref()
                .filter(|pw| !pw.is_empty())
                .map(|pw| SecretString::from(pw.clone()))
        })
}

// ── Translation to BackupConfig ─────────────────────────────────────

/// Build a `BackupConfig` from a profile and global defaults, no CLI flags.
///
/// `api_key` short-circuits the credential chain when the caller already
/// has one (flag or `STACKVAULT_API_KEY`).
pub fn profile_to_backup_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    api_key: Option<SecretString>,
) -> Result<BackupConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: '{}'", profile.url),
    })?;

    let api_key = match api_key {
        Some(key) => key,
        None => resolve_api_key(profile, profile_name)?,
    };

    let output_dir = profile.output_dir.clone().unwrap_or_else(default_output_dir);
    let mut cfg = BackupConfig::new(url, api_key, output_dir);

    cfg.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    cfg.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    cfg.connect_timeout =
        Duration::from_secs(profile.connect_timeout.unwrap_or(defaults.connect_timeout));
    cfg.retry = RetryPolicy {
        max_retries: profile.retries.unwrap_or(defaults.retries),
        delay: Duration::from_secs(profile.retry_delay.unwrap_or(defaults.retry_delay)),
        retry_all_errors: profile.retry_all_errors.unwrap_or(false),
    };

    cfg.backup_password = resolve_backup_password(profile, profile_name);

    if profile.cleanup.unwrap_or(false) {
        let days = profile.retention_days.unwrap_or(defaults.retention_days);
        cfg.retention = Some(retention_policy(days)?);
    }

    cfg.concurrency = profile.concurrency.unwrap_or(defaults.concurrency);
    if profile.require_platform_backup.unwrap_or(false) {
        cfg.failure_policy = FailurePolicy::strict();
    }

    Ok(cfg)
}

/// Validate a retention period given in days.
pub fn retention_policy(days: u32) -> Result<RetentionPolicy, ConfigError> {
    RetentionPolicy::new(days).map_err(|_| ConfigError::Validation {
        field: "retention_days".into(),
        reason: "must be at least 1 day".into(),
    })
}
