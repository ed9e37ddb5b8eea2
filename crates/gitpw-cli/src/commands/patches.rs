//! Handlers for the patch REST resources: `show`, `update` and `list`.

use gitpw_api_models::{Patch, PatchListQuery, PatchUpdate};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::cli::{ListArgs, OutputFormat, ShowArgs, UpdateArgs};
use crate::client::{AppContext, CliError, CliResult, decode_json, fetch_json, send_write};
use crate::links::resolve_patch_links;
use crate::output::{PatchReport, render_patch_list, render_patch_report};

pub(crate) fn patch_url(ctx: &AppContext, patch_id: u64) -> CliResult<Url> {
    let id = patch_id.to_string();
    ctx.endpoint(&["api", "1.0", "patches", &id, ""])
}

pub(crate) fn list_url(ctx: &AppContext, query: &PatchListQuery) -> CliResult<Url> {
    let mut url = ctx.endpoint(&["api", "1.0", "patches", ""])?;
    url.query_pairs_mut().extend_pairs(query.to_query_pairs());
    Ok(url)
}

/// Resolve the links of `patch` and flatten it for rendering.
pub(crate) async fn build_report(ctx: &AppContext, patch: &Patch) -> CliResult<PatchReport> {
    let links = resolve_patch_links(ctx, patch).await;
    if links.has_failures() {
        warn!(patch_id = patch.id, "failed to resolve linked resources");
    }
    let resolved = links.into_resolved()?;
    Ok(PatchReport::new(patch, &resolved))
}

pub(crate) async fn show_patch(ctx: &AppContext, patch_id: u64) -> CliResult<PatchReport> {
    debug!(patch_id, "Showing patch");
    let url = patch_url(ctx, patch_id)?;
    let patch: Patch = fetch_json(ctx, &url).await?;
    build_report(ctx, &patch).await
}

pub(crate) async fn handle_show(
    ctx: &AppContext,
    args: ShowArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let report = show_patch(ctx, args.patch_id).await?;
    render_patch_report(&report, format)
}

pub(crate) async fn update_patch(ctx: &AppContext, args: UpdateArgs) -> CliResult<PatchReport> {
    info!(
        patch_id = args.patch_id,
        commit_ref = ?args.commit_ref,
        state = ?args.state,
        archived = ?args.archived,
        "Updating patch"
    );

    let update = PatchUpdate {
        commit_ref: args.commit_ref,
        state: args.state,
        archived: args.archived,
    };
    if update.is_empty() {
        return Err(CliError::validation(
            "nothing to update; pass --commit-ref, --state or --archived",
        ));
    }
    if ctx.credentials.is_none() {
        return Err(CliError::validation(
            "updating a patch requires credentials; set pw.token, or pw.username and pw.password",
        ));
    }

    let url = patch_url(ctx, args.patch_id)?;
    debug!("PATCH {url}");
    let request = ctx.authorize(ctx.client.patch(url.clone()).json(&update));
    let response = send_write(request, &url).await?;
    let patch: Patch = decode_json(response, &url).await?;
    build_report(ctx, &patch).await
}

pub(crate) async fn handle_update(
    ctx: &AppContext,
    args: UpdateArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let report = update_patch(ctx, args).await?;
    render_patch_report(&report, format)
}

pub(crate) async fn list_patches(ctx: &AppContext, args: ListArgs) -> CliResult<Vec<Patch>> {
    let query = PatchListQuery {
        archived: args.archived(),
        states: args.state,
        submitters: args.submitter,
        delegates: args.delegate,
    };
    info!(
        states = ?query.states,
        submitters = ?query.submitters,
        delegates = ?query.delegates,
        archived = query.archived,
        "Listing patches"
    );
    let url = list_url(ctx, &query)?;
    fetch_json(ctx, &url).await
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: ListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let patches = list_patches(ctx, args).await?;
    render_patch_list(&patches, format)
}
