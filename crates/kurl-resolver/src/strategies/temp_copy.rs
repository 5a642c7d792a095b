//! Remote workflows opened as a temporary local copy

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::config::ResolverConfig;
use crate::context::{NodeContext, RestLocation, TempCopyContext};
use crate::layout::{Locator, MountLayout};
use crate::strategy::ResolveStrategy;

use super::repository::{RepositoryCore, Versions};

/// Resolves for a Hub or Server workflow edited in a local temp copy
///
/// Items of the workflow itself come from the temp copy. Other items are
/// addressed through the local mount point the workflow was opened from,
/// or through the repository when it was not opened from a mount point.
#[derive(Debug, Clone)]
pub struct TempCopyResolver {
    core: RepositoryCore,
}

impl TempCopyResolver {
    /// Create for a temp copy
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the workflow is not
    /// inside its space or the mountpoint URI is not mountpoint-absolute
    pub fn new(context: &TempCopyContext, config: &ResolverConfig) -> Result<Self, ResolutionError> {
        let (default_mount_id, paths, spaces, address, versions) = match &context.location {
            RestLocation::Hub(hub) => (
                hub.default_mount_id.as_str(),
                ContextPaths::new(hub.space_path.clone(), hub.workflow_path.clone())?,
                true,
                &hub.repository_address,
                Versions::Supported {
                    workflow_version: hub.item_version,
                },
            ),
            RestLocation::Server(server) => (
                server.default_mount_id.as_str(),
                ContextPaths::without_space(server.workflow_path.clone())?,
                false,
                &server.repository_address,
                Versions::Unsupported("on KNIME Server"),
            ),
        };

        // Opened from a local mount point: results are addressed through it
        let (layout, locator) = match &context.mountpoint_uri {
            Some(uri) => {
                let local_mount_id = uri.mount_id().ok_or_else(|| {
                    ResolutionError::InvalidContext(format!(
                        "mountpoint URI '{uri}' does not name a mount point"
                    ))
                })?;
                (
                    MountLayout::new(local_mount_id, paths, spaces).with_alias(default_mount_id),
                    Locator::MountTable(local_mount_id.to_string()),
                )
            }
            None => (
                MountLayout::new(default_mount_id, paths, spaces),
                Locator::Repository(address.clone()),
            ),
        };

        Ok(Self {
            core: RepositoryCore::new(
                layout,
                locator,
                Some(context.executor.local_workflow_path.clone()),
                versions,
                config.external_mounts,
            ),
        })
    }
}

impl ResolveStrategy for TempCopyResolver {
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
        "analytics-platform-temp-copy"
    }
}
