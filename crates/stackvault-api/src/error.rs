use std::path::PathBuf;

use thiserror::Error;

/// HTTP statuses that are worth another attempt without `retry_all_errors`.
const TRANSIENT_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Top-level error type for the `stackvault-api` crate.
///
/// `stackvault-core` maps these into run-level failures; callers decide
/// whether a given failure is fatal or just a warning.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The platform rejected the API key (HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response from the platform.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Writing a downloaded body to disk failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }

    /// Returns `true` if another attempt could possibly succeed.
    ///
    /// Local failures (bad URL, TLS setup, disk I/O) never change between
    /// attempts, so they are excluded even under `retry_all_errors`.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::Tls(_) | Self::Io { .. })
    }

    /// Returns `true` if the request ran into a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Api { status, .. } => *status == 408,
            _ => false,
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn server_errors_are_transient() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(api(status).is_transient(), "{status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_not_transient() {
        for status in [400, 403, 404, 422] {
            assert!(!api(status).is_transient(), "{status} should not be transient");
        }
        assert!(!Error::InvalidApiKey.is_transient());
    }

    #[test]
    fn local_failures_are_not_remote() {
        let io = Error::Io {
            path: PathBuf::from("/tmp/x"),
            source: std::io::Error::other("disk full"),
        };
        assert!(!io.is_remote());
        assert!(!Error::Tls("bad cert".into()).is_remote());
        assert!(api(500).is_remote());
        assert!(Error::InvalidApiKey.is_remote());
    }

    #[test]
    fn status_is_exposed() {
        assert_eq!(api(503).status(), Some(503));
        assert_eq!(Error::InvalidApiKey.status(), Some(401));
        assert_eq!(Error::Tls(String::new()).status(), None);
    }
}
