//! Jobs on a Server executor

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::config::ResolverConfig;
use crate::context::{NodeContext, ServerExecutorContext};
use crate::layout::{Locator, MountLayout};
use crate::strategy::ResolveStrategy;

use super::repository::{RepositoryCore, Versions};

const NO_VERSIONS: &str = "on KNIME Server";

/// Resolves against a Server repository
///
/// Servers have neither spaces nor item versions: the space path is empty
/// and any URL carrying a version is rejected, whatever its category.
#[derive(Debug, Clone)]
pub struct ServerExecutorResolver {
    core: RepositoryCore,
}

impl ServerExecutorResolver {
    /// Create for a Server job
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the workflow path
    /// climbs above the repository root
    pub fn new(context: &ServerExecutorContext, config: &ResolverConfig) -> Result<Self, ResolutionError> {
        let location = &context.location;
        let paths = ContextPaths::without_space(location.workflow_path.clone())?;
        Ok(Self {
            core: RepositoryCore::new(
                MountLayout::new(location.default_mount_id.as_str(), paths, false),
                Locator::Repository(location.repository_address.clone()),
                Some(context.executor.local_workflow_path.clone()),
                Versions::Unsupported(NO_VERSIONS),
                config.external_mounts,
            ),
        })
    }
}

impl ResolveStrategy for ServerExecutorResolver {
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
        self.core.check_version(url, url.version().copied())?;
        node.ok_or_else(|| ResolutionError::NoNodeContext {
            url: url.to_string(),
        })?
        .resolve(url, path)
    }

    fn context_paths(&self) -> Option<&ContextPaths> {
        Some(self.core.context_paths())
    }

    fn name(&self) -> &'static str {
        "server-executor"
    }
}
