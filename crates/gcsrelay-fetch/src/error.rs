//! Error types for gcsrelay-fetch.

use thiserror::Error;

use crate::core::is_transient_status;

/// Errors surfaced while fetching the source URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("auth type `{kind}` selected but `{missing}` is not set")]
    AuthConfig { kind: &'static str, missing: &'static str },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {status}: {excerpt}")]
    HttpStatus { status: u16, excerpt: String },
}

impl FetchError {
    /// Whether this failure is worth another attempt.
    ///
    /// Connection-level failures and timeouts are always transient; response
    /// statuses qualify per [`is_transient_status`]. Everything else
    /// (bad configuration, client-error statuses) is final.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::HttpStatus { status, .. } => is_transient_status(*status),
            FetchError::InvalidUrl(_) | FetchError::AuthConfig { .. } => false,
        }
    }
}

/// Auth type string that names no known scheme.
#[derive(Debug, Error)]
#[error("unknown auth type: {0} (expected none, basic or bearer)")]
pub struct ParseAuthKindError(pub String);

/// Method string outside the supported set.
#[derive(Debug, Error)]
#[error("unsupported HTTP method: {0}")]
pub struct ParseMethodError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_timeout_are_transient() {
        assert!(FetchError::Network("connection reset".into()).is_transient());
        assert!(FetchError::Timeout.is_transient());
    }

    #[test]
    fn server_errors_and_throttling_are_transient() {
        for status in [429, 500, 502, 503, 504] {
            let err = FetchError::HttpStatus {
                status,
                excerpt: String::new(),
            };
            assert!(err.is_transient(), "status {status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_final() {
        for status in [400, 401, 403, 404, 410] {
            let err = FetchError::HttpStatus {
                status,
                excerpt: String::new(),
            };
            assert!(!err.is_transient(), "status {status} should be final");
        }
    }

    #[test]
    fn config_errors_are_final() {
        assert!(!FetchError::InvalidUrl("not a url".into()).is_transient());
        let err = FetchError::AuthConfig {
            kind: "basic",
            missing: "auth-password",
        };
        assert!(!err.is_transient());
    }
}
