//! kurl core
//!
//! Building blocks for resolving `knime://` workflow URLs.
//!
//! # Core Concepts
//!
//! - [`KnimeUrl`]: parsed symbolic URL; its authority decides the [`UrlCategory`]
//! - [`RelPath`]: decoded POSIX-style path with scope containment helpers
//! - [`ItemVersion`]: optional version overlay carried in the `version` query
//! - [`ResolvedUrl`]: immutable result of one resolution
//! - [`ResolutionError`]: closed taxonomy of resolution failures
//!
//! # Example
//!
//! ```
//! use kurl_core::{classify, RelPath, UrlCategory};
//!
//! let (category, path, version) = classify("knime://knime.workflow/../data/x.csv?version=3")?;
//! assert_eq!(category, UrlCategory::WorkflowRelative);
//! assert!(path.leaves_scope());
//! assert_eq!(path.normalize(), RelPath::from("../data/x.csv"));
//! assert!(version.is_some());
//! # Ok::<(), kurl_core::ResolutionError>(())
//! ```

#![warn(unreachable_pub)]

mod encode;
mod error;
mod knime_url;
mod path;
mod resolved;
mod version;

pub use encode::{encode_path, file_url, repository_url, DATA_SUFFIX};
pub use error::{ResolutionError, Scope};
pub use knime_url::{
    classify, KnimeUrl, UrlCategory, MOUNTPOINT_AUTHORITY, NODE_AUTHORITY, SCHEME,
    SPACE_AUTHORITY, WORKFLOW_AUTHORITY,
};
pub use path::{PathError, RelPath};
pub use resolved::{ContextPaths, ResolvedUrl};
pub use version::{ItemVersion, VersionError, LEGACY_SPACE_VERSION_PARAM, VERSION_PARAM};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl, Scope,
        UrlCategory,
    };
}
