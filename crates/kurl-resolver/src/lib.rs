//! kurl resolver
//!
//! Execution-context aware resolution of `knime://` workflow URLs.
//!
//! # Core Concepts
//!
//! - [`ExecutionContext`]: where the current workflow runs and is stored
//! - [`KnimeUrlResolver`]: resolver selected once per context; exposes
//!   `resolve`, `resolve_to_absolute` and `change_link_type`
//! - [`ResolveStrategy`]: per-category resolution contract of each context
//! - [`NodeContext`]: caller-supplied node for node-relative URLs
//! - [`ResolverConfig`]: policy knobs, e.g. for foreign mount ids
//!
//! # Example
//!
//! ```
//! use kurl_resolver::{ExecutionContext, KnimeUrlResolver, ResolverConfig};
//!
//! let context: ExecutionContext = toml::from_str(r#"
//!     type = "server-executor"
//!
//!     [executor]
//!     local-workflow-path = "/tmp/job/workflow"
//!
//!     [location]
//!     repository-address = "http://localhost:8080/knime"
//!     default-mount-id = "Server"
//!     workflow-path = "/group/workflow"
//! "#)?;
//!
//! let resolver = KnimeUrlResolver::for_context(Some(&context), &ResolverConfig::default())?;
//! let url = resolver.resolve("knime://knime.workflow/../other.csv", None)?;
//! assert_eq!(url.as_str(), "http://localhost:8080/knime/group/other.csv:data");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]

mod config;
mod context;
mod layout;
mod resolver;
mod strategies;
mod strategy;

pub use config::{ConfigError, ExternalMounts, ResolverConfig};
pub use context::{
    ExecutionContext, ExecutorInfo, HubExecutorContext, HubSpaceLocation, LocalContext,
    MountpointInfo, NodeContext, RemoteEditorContext, RestLocation, Restriction,
    ServerExecutorContext, ServerLocation, TempCopyContext, VirtualNodeContext,
};
pub use resolver::KnimeUrlResolver;
pub use strategies::{
    ContextlessResolver, HubExecutorResolver, LocalResolver, RemoteExecutorResolver,
    ServerExecutorResolver, TempCopyResolver, VirtualNodeResolver,
};
pub use strategy::ResolveStrategy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        ExecutionContext, KnimeUrlResolver, NodeContext, ResolveStrategy, ResolverConfig,
    };
    pub use kurl_core::prelude::*;
}
