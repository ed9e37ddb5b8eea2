//! Handlers that fetch patch content: `apply` and `download`.

use anyhow::anyhow;
use reqwest::Url;
use tracing::{info, warn};

use crate::cli::{ApplyArgs, DownloadArgs, PatchFormat};
use crate::client::{AppContext, CliError, CliResult, fetch_bytes, fetch_text};
use crate::output::page_text;

/// Query marker asking the service to prepend dependency patches.
pub(crate) const INCLUDE_DEPS_PARAM: &str = "include_deps";

pub(crate) fn patch_content_url(
    ctx: &AppContext,
    patch_id: u64,
    format: PatchFormat,
) -> CliResult<Url> {
    ctx.endpoint(&["patch", &patch_id.to_string(), format.as_str()])
}

pub(crate) fn mbox_url(
    ctx: &AppContext,
    patch_id: u64,
    series: Option<u64>,
    include_deps: bool,
) -> CliResult<Url> {
    let mut url = patch_content_url(ctx, patch_id, PatchFormat::Mbox)?;
    if include_deps {
        let mut pairs = url.query_pairs_mut();
        pairs.append_key_only(INCLUDE_DEPS_PARAM);
        if let Some(series) = series {
            pairs.append_pair("series", &series.to_string());
        }
    }
    Ok(url)
}

pub(crate) async fn handle_apply(ctx: &AppContext, args: ApplyArgs) -> CliResult<()> {
    let include_deps = args.include_deps();
    info!(
        patch_id = args.patch_id,
        series = ?args.series,
        deps = include_deps,
        "Applying patch"
    );
    if args.series.is_some() && !include_deps {
        warn!("--series only selects dependencies; ignoring it with --no-deps");
    }

    let url = mbox_url(ctx, args.patch_id, args.series, include_deps)?;
    let mbox = fetch_bytes(ctx, &url).await?;

    let command = &ctx.apply_command;
    let status = command.run_with_input(&mbox).await.map_err(|err| {
        CliError::failure(anyhow!("failed to run '{}': {err}", command.command_line()))
    })?;
    if !status.success() {
        warn!(
            command = %command.command_line(),
            %status,
            "patch application did not complete cleanly"
        );
    }
    Ok(())
}

pub(crate) async fn download_patch(ctx: &AppContext, args: &DownloadArgs) -> CliResult<String> {
    let format = args.format();
    info!(
        patch_id = args.patch_id,
        format = format.as_str(),
        "Downloading patch"
    );
    let url = patch_content_url(ctx, args.patch_id, format)?;
    fetch_text(ctx, &url).await
}

pub(crate) async fn handle_download(ctx: &AppContext, args: DownloadArgs) -> CliResult<()> {
    let text = download_patch(ctx, &args).await?;
    page_text(&text).await
}
