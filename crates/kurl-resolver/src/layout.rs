//! Mount point geometry shared by the strategies
//!
//! [`MountLayout`] turns the path of each URL category into a path from the
//! mount point root and enforces containment. [`Locator`] turns such a path
//! into a concrete URL for remote repositories.

use kurl_core::{
    repository_url, ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl,
    Scope, UrlCategory,
};
use url::Url;

use crate::config::ExternalMounts;

/// Position of the current space and workflow in their mount point
#[derive(Debug, Clone)]
pub(crate) struct MountLayout {
    mount_id: String,
    aliases: Vec<String>,
    paths: ContextPaths,
    spaces: bool,
}

impl MountLayout {
    pub(crate) fn new(mount_id: impl Into<String>, paths: ContextPaths, spaces: bool) -> Self {
        Self {
            mount_id: mount_id.into(),
            aliases: Vec::new(),
            paths,
            spaces,
        }
    }

    /// Another mount id under which the same mount point is known
    pub(crate) fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if alias != self.mount_id && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    /// Mount id used for results of relative URLs
    pub(crate) fn mount_id(&self) -> &str {
        &self.mount_id
    }

    pub(crate) fn paths(&self) -> &ContextPaths {
        &self.paths
    }

    pub(crate) fn has_spaces(&self) -> bool {
        self.spaces
    }

    pub(crate) fn owns(&self, mount_id: &str) -> bool {
        self.mount_id == mount_id || self.aliases.iter().any(|alias| alias == mount_id)
    }

    fn relative_scope(&self) -> Scope {
        if self.spaces {
            Scope::HubSpace
        } else {
            Scope::MountPoint
        }
    }

    pub(crate) fn absolute(&self, path: &RelPath) -> Result<RelPath, ResolutionError> {
        RelPath::root().append_and_contain(path).map_err(|e| {
            ResolutionError::scope_violation(Scope::MountPoint, UrlCategory::MountpointAbsolute, e)
        })
    }

    /// Mountpoint-relative URLs start at the space, like space-relative ones
    pub(crate) fn mountpoint_relative(&self, path: &RelPath) -> Result<RelPath, ResolutionError> {
        self.in_space(path, UrlCategory::MountpointRelative)
    }

    pub(crate) fn space_relative(&self, path: &RelPath) -> Result<RelPath, ResolutionError> {
        self.in_space(path, UrlCategory::HubSpaceRelative)
    }

    fn in_space(&self, path: &RelPath, category: UrlCategory) -> Result<RelPath, ResolutionError> {
        self.paths
            .space_path()
            .append_and_contain(path)
            .map_err(|e| ResolutionError::scope_violation(self.relative_scope(), category, e))
    }

    pub(crate) fn workflow_relative(&self, path: &RelPath) -> Result<RelPath, ResolutionError> {
        let workflow = self.paths.workflow_path();
        if path.leaves_scope() {
            workflow
                .append_within(path, self.paths.space_path())
                .map_err(|e| {
                    ResolutionError::scope_violation(
                        self.relative_scope(),
                        UrlCategory::WorkflowRelative,
                        e,
                    )
                })
        } else {
            workflow.append_and_contain(path).map_err(|e| {
                ResolutionError::scope_violation(Scope::Workflow, UrlCategory::WorkflowRelative, e)
            })
        }
    }

    /// Path below the current workflow, if `item` lies inside it
    pub(crate) fn inside_workflow(&self, item: &RelPath) -> Option<RelPath> {
        item.strip_prefix(self.paths.workflow_path())
    }

    /// Whether `item` can be addressed relative to the current space
    pub(crate) fn is_in_space(&self, item: &RelPath) -> bool {
        item.starts_with(self.paths.space_path())
    }
}

/// Where items outside the local workflow copy are fetched from
#[derive(Debug, Clone)]
pub(crate) enum Locator {
    /// REST repository; items are addressed with the `:data` suffix
    Repository(Url),
    /// Mount table entry; items stay `knime://<mount id>/...`
    MountTable(String),
}

impl Locator {
    pub(crate) fn locate(
        &self,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<Url, ResolutionError> {
        match self {
            Self::Repository(base) => repository_url(base, path, version.as_ref()),
            Self::MountTable(mount_id) => {
                KnimeUrl::mountpoint_absolute(mount_id.as_str(), path.clone(), version).to_url()
            }
        }
    }
}

/// Handle a mountpoint-absolute URL for a mount id the resolver does not own
pub(crate) fn defer_to_mount_table(
    url: &KnimeUrl,
    mount_id: &str,
    path: &RelPath,
    version: Option<ItemVersion>,
    policy: ExternalMounts,
) -> Result<ResolvedUrl, ResolutionError> {
    if policy == ExternalMounts::Reject {
        return Err(ResolutionError::UnknownMountId {
            url: url.to_string(),
            mount_id: mount_id.to_string(),
        });
    }

    let path = RelPath::root().append_and_contain(path).map_err(|e| {
        ResolutionError::scope_violation(Scope::MountPoint, UrlCategory::MountpointAbsolute, e)
    })?;
    tracing::debug!("Mount ID '{}' is not known here, deferring '{}' to the mount table", mount_id, url);

    let target = Locator::MountTable(mount_id.to_string()).locate(&path, version)?;
    Ok(ResolvedUrl::new(target)
        .with_item(mount_id, path)
        .with_version(version)
        .not_relativizable())
}
