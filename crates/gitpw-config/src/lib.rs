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

//! Resolution of server and credential settings for the `git-pw` client.
//!
//! Layout: `model.rs` (resolved settings and overrides), `loader.rs`
//! (`ConfigSource` implementations and layering), `error.rs` (error types).

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigSource, GitConfigSource, resolve_settings};
pub use model::{Credentials, Settings, SettingsOverrides, parse_server};
