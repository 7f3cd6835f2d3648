// ── Runtime backup configuration ──
//
// Describes *what* to back up and *how* to reach the platform. Carries
// credentials and tuning but never touches disk; the CLI builds a
// `BackupConfig` from profiles, flags and environment and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use stackvault_api::{RetryPolicy, TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;
use crate::policy::FailurePolicy;
use crate::retention::RetentionPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Everything one backup run needs.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Platform URL (e.g. `https://portainer.local:9443`).
    pub url: Url,
    pub api_key: SecretString,
    pub tls: TlsVerification,
    pub connect_timeout: Duration,
    /// Total per-request timeout, body included.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Root under which dated run directories are created.
    pub output_dir: PathBuf,
    /// Encrypts the platform export when set.
    pub backup_password: Option<SecretString>,
    /// Remove old run directories after a run. `None` disables cleanup.
    pub retention: Option<RetentionPolicy>,
    /// Stacks extracted at the same time. `1` is strictly sequential.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl BackupConfig {
    /// A config with default transport, retry and failure settings.
    pub fn new(url: Url, api_key: SecretString, output_dir: impl Into<PathBuf>) -> Self {
        let transport = TransportConfig::default();
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            connect_timeout: transport.connect_timeout,
            timeout: transport.timeout,
            retry: transport.retry,
            output_dir: output_dir.into(),
            backup_password: None,
            retention: None,
            concurrency: 1,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Reject settings no run could work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme '{}'", self.url.scheme()),
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::Config {
                message: "output directory must not be empty".into(),
            });
        }
        if self.concurrency == 0 {
            return Err(CoreError::Config {
                message: "concurrency must be at least 1".into(),
            });
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeouts must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            connect_timeout: self.connect_timeout,
            timeout: self.timeout,
            retry: self.retry.clone(),
        }
    }
}
