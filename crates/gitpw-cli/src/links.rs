//! Resolution of linked sub-resources.
//!
//! Patch representations reference their submitter, project and delegate by
//! URL. Each present link costs exactly one extra GET; absent links cost none.

use gitpw_api_models::{Patch, Person, Project, User};
use serde::de::DeserializeOwned;

use crate::client::{AppContext, CliError, CliResult, fetch_json, parse_link};

/// Outcome of following one link field.
#[derive(Debug)]
pub(crate) enum Linked<T> {
    /// The link was `null` or missing.
    Absent,
    Resolved(T),
    Failed(CliError),
}

impl<T: Default> Linked<T> {
    /// Collapse into the resolved value, defaulting when absent.
    pub(crate) fn into_result(self) -> CliResult<T> {
        match self {
            Self::Absent => Ok(T::default()),
            Self::Resolved(value) => Ok(value),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Every link of a patch after resolution.
#[derive(Debug)]
pub(crate) struct PatchLinks {
    pub(crate) submitter: Linked<Person>,
    pub(crate) project: Linked<Project>,
    pub(crate) delegate: Linked<User>,
}

/// Links with every field either resolved or defaulted.
#[derive(Debug, Default)]
pub(crate) struct ResolvedLinks {
    pub(crate) submitter: Person,
    pub(crate) project: Project,
    pub(crate) delegate: User,
}

impl PatchLinks {
    /// Fail on the first sub-fetch error in submitter, project, delegate order.
    pub(crate) fn into_resolved(self) -> CliResult<ResolvedLinks> {
        Ok(ResolvedLinks {
            submitter: self.submitter.into_result()?,
            project: self.project.into_result()?,
            delegate: self.delegate.into_result()?,
        })
    }

    pub(crate) const fn has_failures(&self) -> bool {
        matches!(self.submitter, Linked::Failed(_))
            || matches!(self.project, Linked::Failed(_))
            || matches!(self.delegate, Linked::Failed(_))
    }
}

pub(crate) async fn resolve_link<T: DeserializeOwned>(
    ctx: &AppContext,
    link: Option<&str>,
) -> Linked<T> {
    let Some(link) = link.map(str::trim).filter(|link| !link.is_empty()) else {
        return Linked::Absent;
    };
    let url = match parse_link(link) {
        Ok(url) => url,
        Err(err) => return Linked::Failed(err),
    };
    match fetch_json::<T>(ctx, &url).await {
        Ok(value) => Linked::Resolved(value),
        Err(err) => Linked::Failed(err),
    }
}

/// Follow the submitter, project and delegate links of `patch` in order.
pub(crate) async fn resolve_patch_links(ctx: &AppContext, patch: &Patch) -> PatchLinks {
    PatchLinks {
        submitter: resolve_link(ctx, patch.submitter.as_deref()).await,
        project: resolve_link(ctx, patch.project.as_deref()).await,
        delegate: resolve_link(ctx, patch.delegate.as_deref()).await,
    }
}
