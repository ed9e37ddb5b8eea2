//! Sample payloads shaped like the patch service's API responses.

use serde_json::{Value, json};

/// A small single-patch mailbox.
pub const SAMPLE_MBOX: &str = "From 1234567890abcdef Mon Sep 17 00:00:00 2001
From: Alice Example <alice@example.com>
Date: Tue, 01 Oct 2024 10:00:00 +0000
Subject: [PATCH] docs: fix typo in README

---
 README | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)

diff --git a/README b/README
--- a/README
+++ b/README
@@ -1 +1 @@
-Helo
+Hello
";

/// The diff portion of [`SAMPLE_MBOX`].
pub const SAMPLE_DIFF: &str = "diff --git a/README b/README
--- a/README
+++ b/README
@@ -1 +1 @@
-Helo
+Hello
";

/// API path of the person record linked from [`patch_json`].
pub const SUBMITTER_PATH: &str = "/api/1.0/people/7/";
/// API path of the project record linked from [`patch_json`].
pub const PROJECT_PATH: &str = "/api/1.0/projects/1/";
/// API path of the user record linked from [`patch_json`] when delegated.
pub const DELEGATE_PATH: &str = "/api/1.0/users/3/";

/// Patch detail payload whose links point at `base_url`.
///
/// `delegated` controls whether the `delegate` link is set or `null`.
#[must_use]
pub fn patch_json(base_url: &str, id: u64, delegated: bool) -> Value {
    let base = base_url.trim_end_matches('/');
    json!({
        "id": id,
        "url": format!("{base}/api/1.0/patches/{id}/"),
        "project": format!("{base}{PROJECT_PATH}"),
        "msgid": format!("<{id}-fix-typo@example.com>"),
        "date": "2024-10-01T10:00:00",
        "name": "[PATCH] docs: fix typo in README",
        "commit_ref": null,
        "pull_url": null,
        "state": "new",
        "archived": false,
        "hash": "d1b3a0c5e9f8",
        "submitter": format!("{base}{SUBMITTER_PATH}"),
        "delegate": if delegated { Value::String(format!("{base}{DELEGATE_PATH}")) } else { Value::Null },
        "mbox": format!("{base}/patch/{id}/mbox/"),
        "check": "pending",
        "checks": format!("{base}/api/1.0/patches/{id}/checks/"),
        "tags": {}
    })
}

/// Person payload for the submitter.
#[must_use]
pub fn person_json() -> Value {
    json!({
        "id": 7,
        "name": "Alice Example",
        "email": "alice@example.com",
        "user": null
    })
}

/// Project payload.
#[must_use]
pub fn project_json() -> Value {
    json!({
        "id": 1,
        "name": "Example Project",
        "link_name": "example",
        "list_id": "example.lists.example.com",
        "list_email": "example@lists.example.com"
    })
}

/// User payload for the delegate.
#[must_use]
pub fn user_json() -> Value {
    json!({
        "id": 3,
        "username": "maintainer",
        "first_name": "Mai",
        "last_name": "Ntainer",
        "email": "maintainer@example.com"
    })
}
