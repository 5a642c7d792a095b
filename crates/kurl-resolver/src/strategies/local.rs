//! Workflows stored in a local Analytics Platform workspace

use std::path::PathBuf;

use kurl_core::{
    file_url, ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl, Scope,
    UrlCategory,
};

use crate::config::{ExternalMounts, ResolverConfig};
use crate::context::{LocalContext, NodeContext};
use crate::layout::{defer_to_mount_table, MountLayout};
use crate::strategy::ResolveStrategy;

const NO_VERSIONS: &str = "in the local workspace";

#[derive(Debug, Clone)]
struct LocalMount {
    root: PathBuf,
    layout: MountLayout,
}

/// Resolves against the local file system
///
/// Without mount point information (an extracted `.knwf` file) only
/// workflow-relative and node-relative URLs can be resolved, and
/// workflow-relative ones must stay in the workflow directory.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    workflow_dir: PathBuf,
    mount: Option<LocalMount>,
    external_mounts: ExternalMounts,
}

impl LocalResolver {
    /// Create for a local workflow
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the workflow is not
    /// located below the mount point root
    pub fn new(context: &LocalContext, config: &ResolverConfig) -> Result<Self, ResolutionError> {
        let workflow_dir = context.local_workflow_path.clone();
        let mount = context
            .mountpoint
            .as_ref()
            .map(|info| {
                let relative = workflow_dir.strip_prefix(&info.root).map_err(|_| {
                    ResolutionError::InvalidContext(format!(
                        "workflow '{}' is not inside mount point '{}' at '{}'",
                        workflow_dir.display(),
                        info.mount_id,
                        info.root.display()
                    ))
                })?;
                let workflow_path = RelPath::from_local(relative)
                    .map_err(|e| ResolutionError::InvalidContext(e.to_string()))?;
                Ok::<_, ResolutionError>(LocalMount {
                    root: info.root.clone(),
                    layout: MountLayout::new(
                        info.mount_id.as_str(),
                        ContextPaths::without_space(workflow_path)?,
                        false,
                    ),
                })
            })
            .transpose()?;

        Ok(Self {
            workflow_dir,
            mount,
            external_mounts: config.external_mounts,
        })
    }

    fn check_version(url: &KnimeUrl, version: Option<ItemVersion>) -> Result<(), ResolutionError> {
        match version {
            Some(_) => Err(ResolutionError::versioning_not_supported(url, NO_VERSIONS)),
            None => Ok(()),
        }
    }

    fn mount(&self, url: &KnimeUrl) -> Result<&LocalMount, ResolutionError> {
        self.mount.as_ref().ok_or_else(|| ResolutionError::NoMountpoint {
            url: url.to_string(),
        })
    }

    fn item(&self, mount: &LocalMount, path: RelPath, mount_id: &str) -> Result<ResolvedUrl, ResolutionError> {
        let resolved = match mount.layout.inside_workflow(&path) {
            Some(inside) => ResolvedUrl::new(file_url(&inside.to_local(&self.workflow_dir))?)
                .with_path_inside_workflow(inside),
            None => ResolvedUrl::new(file_url(&path.to_local(&mount.root))?),
        };
        Ok(resolved.with_item(mount_id, path))
    }

    /// Name of the workflow directory; a leading `..` may only re-enter it
    /// when there is no mount point
    fn own_name(&self) -> RelPath {
        self.workflow_dir
            .file_name()
            .map(|name| RelPath::single(name.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Workflow-relative resolution of a workflow outside any mount point
    fn standalone(&self, path: &RelPath) -> Result<ResolvedUrl, ResolutionError> {
        let own = self.own_name();
        let joined = own.append_within(path, &own).map_err(|e| {
            ResolutionError::scope_violation(Scope::Workflow, UrlCategory::WorkflowRelative, e)
        })?;
        let inside = joined.strip_prefix(&own).unwrap_or_default();
        Ok(ResolvedUrl::new(file_url(&inside.to_local(&self.workflow_dir))?)
            .with_path_inside_workflow(inside))
    }
}

impl ResolveStrategy for LocalResolver {
    fn resolve_mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        match self.mount.as_ref().filter(|mount| mount.layout.owns(mount_id)) {
            Some(mount) => {
                Self::check_version(url, version)?;
                let path = mount.layout.absolute(path)?;
                self.item(mount, path, mount_id)
            }
            None => defer_to_mount_table(url, mount_id, path, version, self.external_mounts),
        }
    }

    fn resolve_mountpoint_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Self::check_version(url, version)?;
        let mount = self.mount(url)?;
        let path = mount.layout.mountpoint_relative(path)?;
        self.item(mount, path, mount.layout.mount_id())
    }

    fn resolve_space_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Self::check_version(url, version)?;
        let mount = self.mount(url)?;
        let path = mount.layout.space_relative(path)?;
        self.item(mount, path, mount.layout.mount_id())
    }

    fn resolve_workflow_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Self::check_version(url, version)?;
        match &self.mount {
            Some(mount) => {
                let path = mount.layout.workflow_relative(path)?;
                self.item(mount, path, mount.layout.mount_id())
            }
            None => self.standalone(path),
        }
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
        self.mount.as_ref().map(|mount| mount.layout.paths())
    }

    fn workflow_item(&self, path: &RelPath) -> Option<RelPath> {
        if let Some(mount) = &self.mount {
            let workflow = mount.layout.paths().workflow_path();
            return workflow.join(path).normalize().strip_prefix(workflow);
        }
        let own = self.own_name();
        own.append_within(path, &own).ok()?.strip_prefix(&own)
    }

    fn name(&self) -> &'static str {
        "analytics-platform-local"
    }
}
