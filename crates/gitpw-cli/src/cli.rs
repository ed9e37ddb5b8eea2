//! Argument parsing, settings resolution, and command dispatch.

use std::io::{self, IsTerminal};

use anyhow::anyhow;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gitpw_config::{Credentials, GitConfigSource, Settings, SettingsOverrides, resolve_settings};
use gitpw_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::error;

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::apply::{handle_apply, handle_download};
use crate::commands::patches::{handle_list, handle_show, handle_update};

/// Parses CLI arguments, executes the requested command, and logs any
/// failure. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig::for_verbosity(cli.debug, cli.log_format.into());
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let command_name = command_label(&cli.command);
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            error!(command = command_name, "{}", err.display_message());
            if let Some(hint) = err.hint() {
                error!("{hint}");
            }
            if suggests_debug_flag(&err) {
                error!("Use the '--debug' flag for more information");
            }
            err.exit_code()
        }
    }
}

const fn suggests_debug_flag(err: &CliError) -> bool {
    matches!(err, CliError::Fetch(_) | CliError::Failure(_))
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let overrides = SettingsOverrides {
        server: cli.server,
        username: cli.username,
        password: cli.password,
        token: cli.token,
    };
    let settings = resolve_settings(overrides, &GitConfigSource::new())?;
    let credentials = resolve_credentials(&settings, io::stdin().is_terminal(), |prompt| {
        rpassword::prompt_password(prompt)
    })?;
    let ctx = AppContext::from_settings(&settings, credentials)?;

    execute(&ctx, cli.command, cli.output).await
}

pub(crate) async fn execute(
    ctx: &AppContext,
    command: Command,
    output: OutputFormat,
) -> CliResult<()> {
    match command {
        Command::Apply(args) => handle_apply(ctx, args).await,
        Command::Download(args) => handle_download(ctx, args).await,
        Command::Show(args) => handle_show(ctx, args, output).await,
        Command::Update(args) => handle_update(ctx, args, output).await,
        Command::List(args) => handle_list(ctx, args, output).await,
    }
}

/// Pick credentials from settings, prompting for a missing password when a
/// username is configured and the session is interactive.
pub(crate) fn resolve_credentials(
    settings: &Settings,
    interactive: bool,
    prompt: impl FnOnce(&str) -> io::Result<String>,
) -> CliResult<Option<Credentials>> {
    if let Some(credentials) = settings.credentials() {
        return Ok(Some(credentials));
    }

    match (&settings.username, &settings.password) {
        (Some(username), None) if interactive => {
            let password = prompt(&format!("Password for '{username}': ")).map_err(|err| {
                CliError::failure(anyhow!("failed to read password from stdin: {err}"))
            })?;
            if password.is_empty() {
                return Err(CliError::validation("password cannot be empty"));
            }
            Ok(Some(Credentials::Basic {
                username: username.clone(),
                password,
            }))
        }
        _ => Ok(None),
    }
}

#[derive(Parser)]
#[command(
    name = "git-pw",
    version,
    about = "Interact with a Patchwork instance"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        help = "Output more information about what's going on"
    )]
    pub(crate) debug: bool,
    #[arg(
        long,
        global = true,
        env = "GIT_PW_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub(crate) log_format: LogFormatArg,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "GIT_PW_SERVER",
        help = "Server base URL (defaults to git config pw.server)"
    )]
    pub(crate) server: Option<String>,
    #[arg(long, global = true, env = "GIT_PW_USERNAME")]
    pub(crate) username: Option<String>,
    #[arg(long, global = true, env = "GIT_PW_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(long, global = true, env = "GIT_PW_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Apply a patch locally using 'git am -3'.
    Apply(ApplyArgs),
    /// Download a patch diff/mbox without applying it.
    Download(DownloadArgs),
    /// Show information about a patch.
    Show(ShowArgs),
    /// Update a patch; some changes need maintainer permissions.
    Update(UpdateArgs),
    /// List patches on the instance.
    List(ListArgs),
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    #[arg(help = "Patch identifier")]
    pub(crate) patch_id: u64,
    #[arg(
        long,
        value_name = "SERIES",
        help = "Series to include dependencies from. Defaults to latest."
    )]
    pub(crate) series: Option<u64>,
    #[arg(
        long,
        overrides_with = "no_deps",
        help = "Include dependencies if available (default)"
    )]
    pub(crate) deps: bool,
    #[arg(long = "no-deps", overrides_with = "deps", help = "Apply the patch alone")]
    pub(crate) no_deps: bool,
}

impl ApplyArgs {
    pub(crate) const fn include_deps(&self) -> bool {
        self.deps || !self.no_deps
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PatchFormat {
    Raw,
    Mbox,
}

impl PatchFormat {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Mbox => "mbox",
        }
    }
}

#[derive(Args)]
pub(crate) struct DownloadArgs {
    #[arg(help = "Patch identifier")]
    pub(crate) patch_id: u64,
    #[arg(
        long,
        overrides_with = "mbox",
        help = "Show patch in diff format (default)"
    )]
    pub(crate) diff: bool,
    #[arg(long, overrides_with = "diff", help = "Show patch in mbox format")]
    pub(crate) mbox: bool,
}

impl DownloadArgs {
    pub(crate) const fn format(&self) -> PatchFormat {
        if self.mbox && !self.diff {
            PatchFormat::Mbox
        } else {
            PatchFormat::Raw
        }
    }
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    #[arg(help = "Patch identifier")]
    pub(crate) patch_id: u64,
}

#[derive(Args)]
pub(crate) struct UpdateArgs {
    #[arg(help = "Patch identifier")]
    pub(crate) patch_id: u64,
    #[arg(
        long,
        value_name = "COMMIT_REF",
        help = "Set the patch commit reference hash"
    )]
    pub(crate) commit_ref: Option<String>,
    #[arg(
        long,
        value_name = "STATE",
        help = "Set the patch state as a slug; available states are instance dependent"
    )]
    pub(crate) state: Option<String>,
    #[arg(
        long,
        value_name = "ARCHIVED",
        value_parser = BoolishValueParser::new(),
        help = "Set the patch archived state"
    )]
    pub(crate) archived: Option<bool>,
}

#[derive(Args, Default)]
pub(crate) struct ListArgs {
    #[arg(
        long,
        value_name = "STATE",
        help = "Show only patches matching these states"
    )]
    pub(crate) state: Vec<String>,
    #[arg(
        long,
        value_name = "SUBMITTER",
        help = "Show only patches by these submitters (email or name)"
    )]
    pub(crate) submitter: Vec<String>,
    #[arg(
        long,
        value_name = "DELEGATE",
        help = "Show only patches delegated to these users (email or username)"
    )]
    pub(crate) delegate: Vec<String>,
    #[arg(
        long,
        overrides_with = "no_archived",
        help = "Show only patches that are archived"
    )]
    pub(crate) archived: bool,
    #[arg(
        long = "no-archived",
        overrides_with = "archived",
        help = "Show only patches that are not archived (default)"
    )]
    pub(crate) no_archived: bool,
}

impl ListArgs {
    pub(crate) const fn archived(&self) -> bool {
        self.archived && !self.no_archived
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    #[default]
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Apply(_) => "apply",
        Command::Download(_) => "download",
        Command::Show(_) => "show",
        Command::Update(_) => "update",
        Command::List(_) => "list",
    }
}
