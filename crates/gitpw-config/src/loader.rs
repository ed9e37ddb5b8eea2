//! Layered settings resolution over `git config`.
//!
//! # Design
//! - CLI flags and environment variables (already merged by the argument
//!   parser) take precedence over `pw.*` keys read from git config.
//! - `ConfigSource` keeps the git lookup swappable so resolution can be
//!   exercised without a repository.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{Settings, SettingsOverrides, parse_server};

/// Section holding every client key in git config.
pub const GIT_CONFIG_SECTION: &str = "pw";

/// Backing store for `pw.*` configuration keys.
pub trait ConfigSource {
    /// Look up a key (without the `pw.` prefix), returning `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the store itself cannot be queried.
    fn get(&self, key: &str) -> ConfigResult<Option<String>>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(HashMap::get(self, key).cloned())
    }
}

/// Reads keys through `git config --get pw.<key>`.
#[derive(Debug, Clone)]
pub struct GitConfigSource {
    program: String,
    work_dir: Option<PathBuf>,
}

impl Default for GitConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GitConfigSource {
    /// Query git config from the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
            work_dir: None,
        }
    }

    /// Use a different git executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run lookups from `dir` so its repository-local config applies.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

impl ConfigSource for GitConfigSource {
    fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        let qualified = format!("{GIT_CONFIG_SECTION}.{key}");
        let mut command = Command::new(&self.program);
        command.args(["config", "--get", &qualified]);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let output = match command.output() {
            Ok(output) => output,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(program = %self.program, "git not found; skipping git config lookup");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "git config",
                    source,
                });
            }
        };

        // `git config --get` exits 1 when the key is unset.
        match output.status.code() {
            Some(0) => {}
            Some(1) => return Ok(None),
            _ => {
                return Err(ConfigError::GitConfig {
                    key: qualified,
                    status: output.status.to_string(),
                });
            }
        }

        let value = String::from_utf8(output.stdout)
            .map_err(|_| ConfigError::NonUtf8Value { key: qualified })?;
        let value = value.trim_end_matches(['\r', '\n']);
        Ok((!value.is_empty()).then(|| value.to_string()))
    }
}

/// Merge overrides with values from `source` into resolved [`Settings`].
///
/// # Errors
///
/// Returns an error when no usable server URL is configured or when the
/// source cannot be queried.
pub fn resolve_settings(
    overrides: SettingsOverrides,
    source: &dyn ConfigSource,
) -> ConfigResult<Settings> {
    let server = pick(overrides.server, source, "server")?.ok_or(ConfigError::MissingServer)?;
    let server = parse_server(&server)?;
    let username = pick(overrides.username, source, "username")?;
    let password = pick(overrides.password, source, "password")?;
    let token = pick(overrides.token, source, "token")?;

    debug!(
        server = %server,
        username = username.as_deref().unwrap_or(""),
        has_password = password.is_some(),
        has_token = token.is_some(),
        "resolved configuration"
    );

    Ok(Settings {
        server,
        username,
        password,
        token,
    })
}

fn pick(
    value: Option<String>,
    source: &dyn ConfigSource,
    key: &str,
) -> ConfigResult<Option<String>> {
    match value.filter(|value| !value.trim().is_empty()) {
        Some(value) => Ok(Some(value)),
        None => source.get(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Credentials;

    fn source(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn overrides_win_over_git_config() -> ConfigResult<()> {
        let git = source(&[
            ("server", "https://git-config.example.com"),
            ("username", "bob"),
            ("password", "from-git"),
        ]);
        let overrides = SettingsOverrides {
            server: Some("https://flag.example.com/".into()),
            username: Some("alice".into()),
            ..SettingsOverrides::default()
        };

        let settings = resolve_settings(overrides, &git)?;
        assert_eq!(settings.server.as_str(), "https://flag.example.com/");
        assert_eq!(settings.username.as_deref(), Some("alice"));
        assert_eq!(settings.password.as_deref(), Some("from-git"));
        assert_eq!(
            settings.credentials(),
            Some(Credentials::Basic {
                username: "alice".into(),
                password: "from-git".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn blank_override_falls_back_to_git_config() -> ConfigResult<()> {
        let git = source(&[("server", "https://patchwork.example.com")]);
        let overrides = SettingsOverrides {
            server: Some("   ".into()),
            ..SettingsOverrides::default()
        };
        let settings = resolve_settings(overrides, &git)?;
        assert_eq!(settings.server.host_str(), Some("patchwork.example.com"));
        Ok(())
    }

    #[test]
    fn missing_server_is_reported() {
        let err = resolve_settings(SettingsOverrides::default(), &source(&[]))
            .expect_err("server is required");
        assert!(matches!(err, ConfigError::MissingServer));
    }

    #[test]
    fn missing_git_binary_yields_no_values() -> ConfigResult<()> {
        let git = GitConfigSource::new().with_program("git-pw-definitely-missing-binary");
        assert_eq!(git.get("server")?, None);
        Ok(())
    }

    #[test]
    fn git_config_source_reads_repository_values() -> ConfigResult<()> {
        let git_available = Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success());
        if !git_available {
            return Ok(());
        }

        let dir = tempfile::tempdir().expect("temp dir");
        let init = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status()
            .expect("git init");
        assert!(init.success());
        let set = Command::new("git")
            .args(["config", "pw.server", "https://repo.example.com/"])
            .current_dir(dir.path())
            .status()
            .expect("git config");
        assert!(set.success());

        let source = GitConfigSource::new().in_dir(dir.path());
        assert_eq!(
            source.get("server")?.as_deref(),
            Some("https://repo.example.com/")
        );
        assert_eq!(source.get("gitpw-test-unset-key")?, None);
        Ok(())
    }
}
