#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Typed records for the patch-tracking service's REST resources.
//!
//! The service links related resources by URL instead of nesting them, so a
//! [`Patch`] carries plain strings for its submitter, project and delegate.
//! Every record tolerates partial payloads: unknown fields are ignored and missing or
//! `null` fields fall back to their defaults.
use serde::{Deserialize, Serialize};

/// Detailed view of a single patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Patch {
    /// Numeric identifier assigned by the service.
    pub id: u64,
    /// Canonical API URL of this patch.
    pub url: Option<String>,
    /// `Message-ID` header of the email carrying the patch.
    pub msgid: Option<String>,
    /// Submission timestamp as reported by the service.
    pub date: Option<String>,
    /// Patch subject line.
    pub name: Option<String>,
    /// Link to the submitting [`Person`].
    pub submitter: Option<String>,
    /// Slugified state label (for example `new`, `under-review`).
    pub state: Option<String>,
    /// Whether the patch is archived.
    pub archived: Option<bool>,
    /// Link to the owning [`Project`].
    pub project: Option<String>,
    /// Link to the delegated [`User`], `None` when unassigned.
    pub delegate: Option<String>,
    /// Commit hash the patch landed as, when recorded.
    pub commit_ref: Option<String>,
}

/// A person known to the service, usually a patch submitter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Person {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

impl Person {
    /// Render the person as `name (email)`.
    ///
    /// Returns an empty string when neither part is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.name.as_deref(), self.email.as_deref()) {
            (None, None) => String::new(),
            (Some(name), None) => name.to_string(),
            (None, Some(email)) => format!("({email})"),
            (Some(name), Some(email)) => format!("{name} ({email})"),
        }
    }
}

/// A project hosted on the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Project {
    /// Human-readable project name.
    pub name: Option<String>,
    /// Short name used in web URLs.
    pub link_name: Option<String>,
}

/// A registered user account, usually a patch delegate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct User {
    /// Login name.
    pub username: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

/// Partial update submitted for a patch; only populated fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchUpdate {
    /// New commit reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_ref: Option<String>,
    /// New state label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// New archived flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl PatchUpdate {
    /// Returns `true` when no field would be changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commit_ref.is_none() && self.state.is_none() && self.archived.is_none()
    }
}

/// Filters accepted by the patch list endpoint.
///
/// Values of the same kind are sent as repeated parameters, which the service
/// ORs together; different kinds are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchListQuery {
    /// State slugs to match.
    pub states: Vec<String>,
    /// Submitter names or emails to match.
    pub submitters: Vec<String>,
    /// Delegate usernames or emails to match.
    pub delegates: Vec<String>,
    /// Restrict to archived (`true`) or unarchived (`false`) patches.
    pub archived: bool,
}

impl PatchListQuery {
    /// Flatten the filters into ordered `(name, value)` query pairs.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(
            self.states.len() + self.submitters.len() + self.delegates.len() + 1,
        );
        pairs.extend(self.states.iter().map(|value| ("state", value.clone())));
        pairs.extend(
            self.submitters
                .iter()
                .map(|value| ("submitter", value.clone())),
        );
        pairs.extend(self.delegates.iter().map(|value| ("delegate", value.clone())));
        pairs.push(("archived", self.archived.to_string()));
        pairs
    }
}
