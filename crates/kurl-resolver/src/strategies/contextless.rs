//! Resolution without a workflow

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::config::{ExternalMounts, ResolverConfig};
use crate::context::NodeContext;
use crate::layout::defer_to_mount_table;
use crate::strategy::ResolveStrategy;

/// Used when no execution context exists
///
/// Mountpoint-absolute URLs go to the mount table unchanged; relative URLs
/// have nothing to be relative to.
#[derive(Debug, Clone, Default)]
pub struct ContextlessResolver {
    external_mounts: ExternalMounts,
}

impl ContextlessResolver {
    /// Create with the given configuration
    #[must_use]
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            external_mounts: config.external_mounts,
        }
    }

    fn no_context(url: &KnimeUrl) -> ResolutionError {
        ResolutionError::NoWorkflowContext {
            url: url.to_string(),
        }
    }
}

impl ResolveStrategy for ContextlessResolver {
    fn resolve_mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        defer_to_mount_table(url, mount_id, path, version, self.external_mounts)
    }

    fn resolve_mountpoint_relative(
        &self,
        url: &KnimeUrl,
        _path: &RelPath,
        _version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(Self::no_context(url))
    }

    fn resolve_space_relative(
        &self,
        url: &KnimeUrl,
        _path: &RelPath,
        _version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(Self::no_context(url))
    }

    fn resolve_workflow_relative(
        &self,
        url: &KnimeUrl,
        _path: &RelPath,
        _version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(Self::no_context(url))
    }

    fn resolve_node_relative(
        &self,
        url: &KnimeUrl,
        _path: &RelPath,
        _node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(Self::no_context(url))
    }

    fn context_paths(&self) -> Option<&ContextPaths> {
        None
    }

    fn name(&self) -> &'static str {
        "contextless"
    }
}
