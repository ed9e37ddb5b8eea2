//! Error types for configuration resolution.

use std::io;

use thiserror::Error;

/// Primary error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No server URL was supplied by any source.
    #[error("server information missing")]
    MissingServer,
    /// The configured server URL could not be used.
    #[error("invalid server URL '{value}': {reason}")]
    InvalidServer {
        /// Offending value as configured.
        value: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },
    /// `git config` exited with an unexpected status.
    #[error("git config lookup for '{key}' failed with status {status}")]
    GitConfig {
        /// Fully qualified key that was requested.
        key: String,
        /// Exit status reported by git, if any.
        status: String,
    },
    /// Value returned by `git config` was not valid UTF-8.
    #[error("git config value for '{key}' is not valid UTF-8")]
    NonUtf8Value {
        /// Fully qualified key that was requested.
        key: String,
    },
    /// Spawning or talking to a helper process failed.
    #[error("{operation} failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_server_message_includes_value_and_reason() {
        let err = ConfigError::InvalidServer {
            value: "ftp://example.com".into(),
            reason: "unsupported scheme".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid server URL 'ftp://example.com': unsupported scheme"
        );
    }

    #[test]
    fn io_error_exposes_source() {
        let err = ConfigError::Io {
            operation: "git config",
            source: io::Error::other("boom"),
        };
        assert!(err.source().is_some());
    }
}
