//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use stackvault_config::ConfigError;
use stackvault_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the platform at {url}")]
    #[diagnostic(
        code(stackvault::connection_failed),
        help(
            "Check that the platform is running and reachable.\n\
             URL: {url}\n\
             Try: stackvault endpoints list --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(stackvault::tls_error),
        help(
            "For a self-signed certificate use --insecure (-k),\n\
             or point ca_cert in your profile at the issuing CA."
        )
    )]
    TlsError { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(stackvault::auth_failed),
        help(
            "The platform rejected the API key.\n\
             Create a new access token in the platform's user settings, then run:\n\
             stackvault config set-key --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(stackvault::no_credentials),
        help(
            "Configure credentials with: stackvault config init\n\
             Or set the STACKVAULT_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Run ──────────────────────────────────────────────────────────
    #[error("Backup aborted: {step} failed")]
    #[diagnostic(
        code(stackvault::step_failed),
        help("{message}")
    )]
    StepFailed { step: String, message: String },

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(stackvault::api_error))]
    ApiError { status: u16, message: String },

    #[error("Request failed: {message}")]
    #[diagnostic(code(stackvault::request_failed))]
    RequestFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stackvault::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(stackvault::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: stackvault config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No platform configured")]
    #[diagnostic(
        code(stackvault::no_config),
        help(
            "Create a profile with: stackvault config init\n\
             Or pass --url and --api-key.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(stackvault::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(stackvault::keyring),
        help("Store the secret in the profile or an environment variable instead.")
    )]
    Keyring(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(stackvault::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out during {step}")]
    #[diagnostic(
        code(stackvault::timeout),
        help("Increase the limit with --timeout or check platform responsiveness.")
    )]
    Timeout { step: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(code(stackvault::io))]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(stackvault::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(stackvault::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Convert a core failure, naming `profile` in authentication help.
    pub fn from_core(err: CoreError, profile: &str) -> Self {
        match err {
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Io { path, source } => Self::FileIo {
                path: path.display().to_string(),
                source,
            },
            CoreError::Step { step, source } => Self::from_api(source, &step.to_string(), profile),
            CoreError::Api(source) => Self::from_api(source, "request", profile),
        }
    }

    fn from_api(err: stackvault_core::ApiError, step: &str, profile: &str) -> Self {
        use stackvault_core::ApiError;

        match err {
            ApiError::InvalidApiKey => Self::AuthFailed {
                profile: profile.into(),
            },
            ApiError::Tls(reason) => Self::TlsError { reason },
            ref e if e.is_timeout() => Self::Timeout { step: step.into() },
            ApiError::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            ApiError::Api { status, message } if step == "request" => {
                Self::ApiError { status, message }
            }
            other if step == "request" => Self::RequestFailed {
                message: other.to_string(),
            },
            other => Self::StepFailed {
                step: step.into(),
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Keyring(err) => Self::Keyring(err.to_string()),
            ConfigError::Serialization(err) => Self::Validation {
                field: "config".into(),
                reason: err.to_string(),
            },
            ConfigError::Io(err) => Self::Io(err),
        }
    }
}
