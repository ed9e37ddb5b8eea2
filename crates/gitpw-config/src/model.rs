//! Resolved settings and the overrides supplied on the command line.

use std::fmt;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Values supplied by CLI flags or environment variables.
///
/// Any field left as `None` falls back to the matching `pw.*` git config key.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Server base URL.
    pub server: Option<String>,
    /// Username for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// API token; preferred over username/password when present.
    pub token: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Clone)]
pub struct Settings {
    /// Server base URL; a path prefix is kept without a trailing slash.
    pub server: Url,
    /// Username for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// API token.
    pub token: Option<String>,
}

impl Settings {
    /// Credentials to attach to requests, if enough information is present.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(token) = self.token.as_deref().map(str::trim) {
            if !token.is_empty() {
                return Some(Credentials::Token(token.to_string()));
            }
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Settings")
            .field("server", &self.server.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Authentication material attached to each request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Token <token>`.
    Token(String),
    /// HTTP basic authentication.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => formatter.write_str("Token(<redacted>)"),
            Self::Basic { username, .. } => formatter
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Parse and normalise a server base URL.
///
/// # Errors
///
/// Returns [`ConfigError::MissingServer`] for blank input and
/// [`ConfigError::InvalidServer`] when the value is not an absolute
/// `http`/`https` URL.
pub fn parse_server(raw: &str) -> ConfigResult<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::MissingServer);
    }

    let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidServer {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidServer {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidServer {
            value: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: Option<&str>, username: Option<&str>, password: Option<&str>) -> Settings {
        Settings {
            server: parse_server("https://patchwork.example.com").expect("valid server"),
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn parse_server_strips_trailing_slash() {
        let url = parse_server("https://patchwork.example.com/pw/").expect("valid server");
        assert_eq!(url.as_str(), "https://patchwork.example.com/pw");

        let root = parse_server("https://patchwork.example.com").expect("valid server");
        assert_eq!(root.as_str(), "https://patchwork.example.com/");
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn parse_server_rejects_blank_and_foreign_schemes() {
        assert!(matches!(parse_server("  "), Err(ConfigError::MissingServer)));
        assert!(matches!(
            parse_server("ftp://patchwork.example.com"),
            Err(ConfigError::InvalidServer { .. })
        ));
        assert!(matches!(
            parse_server("patchwork.example.com"),
            Err(ConfigError::InvalidServer { .. })
        ));
    }

    #[test]
    fn token_takes_precedence_over_basic_credentials() {
        let resolved = settings(Some(" abc123 "), Some("alice"), Some("secret"));
        assert_eq!(
            resolved.credentials(),
            Some(Credentials::Token("abc123".into()))
        );
    }

    #[test]
    fn basic_credentials_require_both_parts() {
        assert_eq!(
            settings(None, Some("alice"), Some("secret")).credentials(),
            Some(Credentials::Basic {
                username: "alice".into(),
                password: "secret".into(),
            })
        );
        assert_eq!(settings(None, Some("alice"), None).credentials(), None);
        assert_eq!(settings(Some("  "), None, None).credentials(), None);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", settings(Some("abc123"), Some("alice"), Some("secret")));
        assert!(!rendered.contains("abc123"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("alice"));
    }
}
