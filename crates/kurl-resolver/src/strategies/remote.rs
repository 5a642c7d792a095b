//! Local dialogs of a workflow running on a remote executor

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::config::ResolverConfig;
use crate::context::{NodeContext, RemoteEditorContext};
use crate::layout::{Locator, MountLayout};
use crate::strategy::ResolveStrategy;

use super::repository::{RepositoryCore, Versions};

/// Resolves everything to mountpoint-absolute URLs for the local mount table
///
/// Only the mountpoint URI of the remote workflow is known locally, so
/// there is no local copy and no node directory.
#[derive(Debug, Clone)]
pub struct RemoteExecutorResolver {
    core: RepositoryCore,
}

impl RemoteExecutorResolver {
    /// Create for a remote workflow editor
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the mountpoint URI is
    /// not mountpoint-absolute or the workflow is not inside its space
    pub fn new(context: &RemoteEditorContext, config: &ResolverConfig) -> Result<Self, ResolutionError> {
        let uri = &context.mountpoint_uri;
        let mount_id = uri.mount_id().ok_or_else(|| {
            ResolutionError::InvalidContext(format!("mountpoint URI '{uri}' does not name a mount point"))
        })?;

        let (layout, versions) = match &context.hub_space {
            Some(hub) => (
                MountLayout::new(
                    mount_id,
                    ContextPaths::new(hub.space_path.clone(), hub.workflow_path.clone())?,
                    true,
                )
                .with_alias(hub.default_mount_id.as_str()),
                Versions::Supported {
                    workflow_version: hub.item_version,
                },
            ),
            None => (
                MountLayout::new(mount_id, ContextPaths::without_space(uri.path().clone())?, false),
                Versions::Unsupported("on KNIME Server"),
            ),
        };

        Ok(Self {
            core: RepositoryCore::new(
                layout,
                Locator::MountTable(mount_id.to_string()),
                None,
                versions,
                config.external_mounts,
            ),
        })
    }
}

impl ResolveStrategy for RemoteExecutorResolver {
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
        _path: &RelPath,
        _node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(ResolutionError::NodeRelativeNotSupported {
            url: url.to_string(),
            reason: "in the editor of a remotely executed workflow".to_string(),
        })
    }

    fn context_paths(&self) -> Option<&ContextPaths> {
        Some(self.core.context_paths())
    }

    fn name(&self) -> &'static str {
        "remote-executor-editor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_editor() -> RemoteExecutorResolver {
        let context = RemoteEditorContext {
            mountpoint_uri: KnimeUrl::parse("knime://ServerMount/group/workflow").unwrap(),
            hub_space: None,
        };
        RemoteExecutorResolver::new(&context, &ResolverConfig::default()).unwrap()
    }

    #[test]
    fn workflow_relative_stays_symbolic() {
        let url = KnimeUrl::parse("knime://knime.workflow/data/x.csv").unwrap();
        let resolved = server_editor()
            .resolve_workflow_relative(&url, url.path(), None)
            .unwrap();
        assert_eq!(
            resolved.resource_url().as_str(),
            "knime://ServerMount/group/workflow/data/x.csv"
        );
        assert_eq!(resolved.path_inside_workflow(), Some(&RelPath::from("data/x.csv")));
    }

    #[test]
    fn node_relative_is_rejected() {
        let url = KnimeUrl::parse("knime://knime.node/x").unwrap();
        let node = NodeContext::saved("/ws/wf", "/ws/wf/node");
        let err = server_editor()
            .resolve_node_relative(&url, url.path(), Some(&node))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NodeRelativeNotSupported { .. }));
    }

    #[test]
    fn relative_uri_is_invalid() {
        let context = RemoteEditorContext {
            mountpoint_uri: KnimeUrl::parse("knime://knime.mountpoint/wf").unwrap(),
            hub_space: None,
        };
        assert!(matches!(
            RemoteExecutorResolver::new(&context, &ResolverConfig::default()),
            Err(ResolutionError::InvalidContext(_))
        ));
    }
}
