// ── Core error types ──
//
// Run-level failures from stackvault-core. Only configuration problems and
// the steps the failure policy marks as aborting ever reach the caller;
// per-stack failures are captured into the run report instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::policy::Step;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Run step failures ────────────────────────────────────────────
    /// A step the failure policy treats as fatal could not complete.
    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: stackvault_api::Error,
    },

    // ── API errors outside a policy-governed step ────────────────────
    #[error(transparent)]
    Api(#[from] stackvault_api::Error),

    // ── Local filesystem errors ──────────────────────────────────────
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying API error, if this failure came from the platform.
    pub fn api_error(&self) -> Option<&stackvault_api::Error> {
        match self {
            Self::Step { source, .. } | Self::Api(source) => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if the platform rejected the API key.
    pub fn is_auth(&self) -> bool {
        matches!(self.api_error(), Some(stackvault_api::Error::InvalidApiKey))
    }

    /// Returns `true` if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        self.api_error().is_some_and(stackvault_api::Error::is_timeout)
    }

    /// Returns `true` if the platform could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(
            self.api_error(),
            Some(stackvault_api::Error::Transport(e)) if e.is_connect()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failure_names_the_step() {
        let err = CoreError::Step {
            step: Step::ResolveEndpoints,
            source: stackvault_api::Error::Api {
                status: 500,
                message: "boom".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "endpoint resolution failed: API error (HTTP 500): boom"
        );
        assert!(!err.is_auth());
    }

    #[test]
    fn auth_failures_are_classified() {
        let err = CoreError::Step {
            step: Step::ListStacks,
            source: stackvault_api::Error::InvalidApiKey,
        };
        assert!(err.is_auth());
        assert!(CoreError::Api(stackvault_api::Error::InvalidApiKey).is_auth());
        assert!(!CoreError::Config { message: String::new() }.is_auth());
    }
}
