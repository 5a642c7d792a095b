//! Jobs on a Hub executor

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::config::ResolverConfig;
use crate::context::{HubExecutorContext, NodeContext};
use crate::layout::{Locator, MountLayout};
use crate::strategy::ResolveStrategy;

use super::repository::{RepositoryCore, Versions};

/// Resolves against the Hub repository the job's workflow comes from
///
/// References into the running workflow resolve to the executor's local
/// copy; everything else becomes a repository URL with the `:data` suffix.
#[derive(Debug, Clone)]
pub struct HubExecutorResolver {
    core: RepositoryCore,
}

impl HubExecutorResolver {
    /// Create for a Hub job
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the workflow is not
    /// inside its space
    pub fn new(context: &HubExecutorContext, config: &ResolverConfig) -> Result<Self, ResolutionError> {
        let location = &context.location;
        let paths = ContextPaths::new(location.space_path.clone(), location.workflow_path.clone())?;
        Ok(Self {
            core: RepositoryCore::new(
                MountLayout::new(location.default_mount_id.as_str(), paths, true),
                Locator::Repository(location.repository_address.clone()),
                Some(context.executor.local_workflow_path.clone()),
                Versions::Supported {
                    workflow_version: location.item_version,
                },
                config.external_mounts,
            ),
        })
    }
}

impl ResolveStrategy for HubExecutorResolver {
    fn resolve_mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.core.mountpoint_absolute(url, mount_id, path, version)
    }

    fn resolve_mountpoint_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.core.mountpoint_relative(url, path, version)
    }

    fn resolve_space_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.core.space_relative(url, path, version)
    }

    fn resolve_workflow_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.core.workflow_relative(url, path, version)
    }

    fn resolve_node_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        node.ok_or_else(|| ResolutionError::NoNodeContext {
            url: url.to_string(),
        })?
        .resolve(url, path)
    }

    fn context_paths(&self) -> Option<&ContextPaths> {
        Some(self.core.context_paths())
    }

    fn name(&self) -> &'static str {
        "hub-executor"
    }
}
