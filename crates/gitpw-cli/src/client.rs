//! Shared client utilities, error types, and the authenticated fetch helper.

use std::fmt::{self, Display, Formatter};
use std::io::{self, ErrorKind};
use std::process::{ExitStatus, Stdio};

use anyhow::anyhow;
use gitpw_config::{ConfigError, Credentials, Settings};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub(crate) const USER_AGENT: &str = concat!("git-pw/", env!("CARGO_PKG_VERSION"));

const AUTH_HINT: &str = "Is your git-config correct? Check pw.username and pw.password, or pw.token";
const FETCH_HINT: &str = "Is your git-config correct? Check that pw.server points at the service";

/// CLI-level error type separating usage problems from remote failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Auth(String),
    Fetch(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Auth(_) | Self::Fetch(_) | Self::Failure(_) => 1,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Auth(message) | Self::Fetch(message) => {
                message.clone()
            }
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    /// Follow-up advice logged after the message.
    pub(crate) const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Auth(_) => Some(AUTH_HINT),
            Self::Fetch(_) => Some(FETCH_HINT),
            Self::Validation(_) | Self::Failure(_) => None,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingServer => Self::validation(
                "server information missing; set pw.server in git config or pass --server",
            ),
            ConfigError::InvalidServer { .. } => Self::validation(err.to_string()),
            other => Self::failure(other),
        }
    }
}

/// External program that receives a downloaded mailbox on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExternalCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

impl ExternalCommand {
    /// `git am -3`: apply a mailbox, falling back to a three-way merge.
    pub(crate) fn git_am() -> Self {
        Self {
            program: "git".to_string(),
            args: vec!["am".to_string(), "-3".to_string()],
        }
    }

    pub(crate) fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the command, stream `input` to its stdin, and wait for exit.
    ///
    /// A child that exits before consuming all input is not an error here;
    /// its exit status is returned as-is.
    pub(crate) async fn run_with_input(&self, input: &[u8]) -> io::Result<ExitStatus> {
        debug!(command = %self.command_line(), bytes = input.len(), "spawning");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                Err(err) => return Err(err),
            }
            // Dropping stdin closes the pipe so the child sees EOF.
        }

        child.wait().await
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) server: Url,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) apply_command: ExternalCommand,
}

impl AppContext {
    /// Build the HTTP client and context for resolved settings.
    pub(crate) fn from_settings(
        settings: &Settings,
        credentials: Option<Credentials>,
    ) -> CliResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            server: settings.server.clone(),
            credentials,
            apply_command: ExternalCommand::git_am(),
        })
    }

    /// Append path segments to the server URL, keeping any path prefix.
    ///
    /// A trailing `""` segment produces a trailing slash.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> CliResult<Url> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|()| CliError::failure(anyhow!("server URL cannot be used as a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the configured credentials to a request.
    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Token(token)) => match token_header(token) {
                Some(value) => builder.header(AUTHORIZATION, value),
                None => builder,
            },
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            None => builder,
        }
    }
}

fn token_header(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Token {}", token.trim())).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// Map a response status onto the fetch outcome.
///
/// Only `200 OK` counts as success; `401`/`403` are credential problems and
/// everything else is treated as a misconfigured server.
pub(crate) fn classify_status(status: StatusCode, url: &Url) -> CliResult<()> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CliError::Auth(format!(
            "Failed to fetch {url}: invalid credentials (status {status})"
        ))),
        other => Err(CliError::Fetch(format!(
            "Failed to fetch {url}: unexpected status {other}"
        ))),
    }
}

async fn send(request: RequestBuilder, url: &Url) -> CliResult<Response> {
    request
        .send()
        .await
        .map_err(|err| CliError::Fetch(format!("Failed to fetch {url}: {err}")))
}

/// Send a prepared request and classify its status before any body is read.
pub(crate) async fn send_checked(request: RequestBuilder, url: &Url) -> CliResult<Response> {
    let response = send(request, url).await?;
    classify_status(response.status(), url)?;
    debug!(%url, "got response");
    Ok(response)
}

/// Error payload the service returns for rejected writes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    detail: Option<String>,
}

/// Send a write request; a rejection other than `401`/`403` carries the
/// service's `detail` message when the body provides one.
pub(crate) async fn send_write(request: RequestBuilder, url: &Url) -> CliResult<Response> {
    let response = send(request, url).await?;
    match classify_status(response.status(), url) {
        Ok(()) => {
            debug!(%url, "got response");
            Ok(response)
        }
        Err(CliError::Fetch(message)) => match rejection_detail(response).await {
            Some(detail) => Err(CliError::Fetch(format!("{message}: {detail}"))),
            None => Err(CliError::Fetch(message)),
        },
        Err(err) => Err(err),
    }
}

async fn rejection_detail(response: Response) -> Option<String> {
    let body = response.json::<ErrorDetail>().await.ok()?;
    body.detail.filter(|detail| !detail.trim().is_empty())
}

/// Issue an authenticated GET against `url`.
pub(crate) async fn fetch(ctx: &AppContext, url: &Url) -> CliResult<Response> {
    debug!("GET {url}");
    send_checked(ctx.authorize(ctx.client.get(url.clone())), url).await
}

pub(crate) async fn fetch_bytes(ctx: &AppContext, url: &Url) -> CliResult<Vec<u8>> {
    let response = fetch(ctx, url).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| CliError::Fetch(format!("Failed to read response from {url}: {err}")))?;
    Ok(bytes.to_vec())
}

pub(crate) async fn fetch_text(ctx: &AppContext, url: &Url) -> CliResult<String> {
    let response = fetch(ctx, url).await?;
    response
        .text()
        .await
        .map_err(|err| CliError::Fetch(format!("Failed to read response from {url}: {err}")))
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(ctx: &AppContext, url: &Url) -> CliResult<T> {
    let response = fetch(ctx, url).await?;
    decode_json(response, url).await
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response, url: &Url) -> CliResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to parse response from {url}: {err}")))
}

/// Parse a resource link embedded in a response.
pub(crate) fn parse_link(link: &str) -> CliResult<Url> {
    link.parse::<Url>()
        .map_err(|err| CliError::failure(anyhow!("invalid resource link '{link}': {err}")))
}

#[cfg(test)]
impl AppContext {
    /// Context pointing at a mock server with no credentials.
    pub(crate) fn for_server(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            server: base_url.parse().expect("valid URL"),
            credentials: None,
            apply_command: ExternalCommand::git_am(),
        }
    }

    pub(crate) fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}
