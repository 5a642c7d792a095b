//! Resolution against a remote repository
//!
//! Shared by every strategy whose workflow lives in a Hub or Server
//! repository. Items of the current workflow come from the local copy when
//! there is one; everything else goes through the [`Locator`]. A
//! workflow-relative path that starts with `..` names the workflow from
//! outside and is always located, even when it re-enters the workflow.

use std::path::PathBuf;

use kurl_core::{
    file_url, ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl,
};

use crate::config::ExternalMounts;
use crate::layout::{defer_to_mount_table, Locator, MountLayout};

/// Version support of the backing repository
#[derive(Debug, Clone)]
pub(crate) enum Versions {
    /// Hub repository; `workflow_version` is the version being run
    Supported { workflow_version: Option<ItemVersion> },
    /// No versions; the text says where, e.g. "on KNIME Server"
    Unsupported(&'static str),
}

#[derive(Debug, Clone)]
pub(crate) struct RepositoryCore {
    layout: MountLayout,
    locator: Locator,
    local_copy: Option<PathBuf>,
    versions: Versions,
    external_mounts: ExternalMounts,
}

impl RepositoryCore {
    pub(crate) fn new(
        layout: MountLayout,
        locator: Locator,
        local_copy: Option<PathBuf>,
        versions: Versions,
        external_mounts: ExternalMounts,
    ) -> Self {
        Self {
            layout,
            locator,
            local_copy,
            versions,
            external_mounts,
        }
    }

    pub(crate) fn context_paths(&self) -> &ContextPaths {
        self.layout.paths()
    }

    pub(crate) fn check_version(
        &self,
        url: &KnimeUrl,
        version: Option<ItemVersion>,
    ) -> Result<(), ResolutionError> {
        match (&self.versions, version) {
            (Versions::Unsupported(location), Some(_)) => {
                Err(ResolutionError::versioning_not_supported(url, *location))
            }
            _ => Ok(()),
        }
    }

    /// Whether the local copy holds the requested version
    fn is_local_version(&self, version: Option<ItemVersion>) -> bool {
        match (version, &self.versions) {
            (None, _) => true,
            (Some(requested), Versions::Supported { workflow_version }) => {
                *workflow_version == Some(requested)
            }
            (Some(_), Versions::Unsupported(_)) => false,
        }
    }

    /// Build the result for an item at `path` from the mount point root
    ///
    /// `from_inside` is false for references that leave the workflow first.
    fn item(
        &self,
        path: RelPath,
        version: Option<ItemVersion>,
        mount_id: &str,
        from_inside: bool,
    ) -> Result<ResolvedUrl, ResolutionError> {
        let inside = self
            .layout
            .inside_workflow(&path)
            .filter(|_| from_inside && self.is_local_version(version));

        let resolved = match (&self.local_copy, inside) {
            (Some(local), Some(inside)) => {
                ResolvedUrl::new(file_url(&inside.to_local(local))?).with_path_inside_workflow(inside)
            }
            (None, Some(inside)) => ResolvedUrl::new(self.locator.locate(&path, version)?)
                .with_version(version)
                .with_path_inside_workflow(inside),
            (_, None) => ResolvedUrl::new(self.locator.locate(&path, version)?).with_version(version),
        };

        let in_space = self.layout.is_in_space(&path);
        Ok(resolved.with_item(mount_id, path).relativizable_if(in_space))
    }

    pub(crate) fn mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.check_version(url, version)?;
        if !self.layout.owns(mount_id) {
            return defer_to_mount_table(url, mount_id, path, version, self.external_mounts);
        }

        if self.layout.has_spaces() && path.is_item_id() {
            let target = self.locator.locate(path, version)?;
            return Ok(ResolvedUrl::new(target)
                .with_item(mount_id, path.clone())
                .with_version(version)
                .not_relativizable());
        }

        let path = self.layout.absolute(path)?;
        self.item(path, version, mount_id, true)
    }

    pub(crate) fn mountpoint_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.check_version(url, version)?;
        let path = self.layout.mountpoint_relative(path)?;
        self.item(path, version, self.layout.mount_id(), true)
    }

    pub(crate) fn space_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.check_version(url, version)?;
        let path = self.layout.space_relative(path)?;
        self.item(path, version, self.layout.mount_id(), true)
    }

    pub(crate) fn workflow_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.check_version(url, version)?;
        let from_inside = !path.leaves_scope();
        let path = self.layout.workflow_relative(path)?;
        self.item(path, version, self.layout.mount_id(), from_inside)
    }
}
