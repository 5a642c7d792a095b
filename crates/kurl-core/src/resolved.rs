//! Resolution results

use serde::Serialize;
use url::Url;

use crate::error::ResolutionError;
use crate::path::RelPath;
use crate::version::ItemVersion;

/// Location of the current space and workflow inside their mount point
///
/// The space path is empty unless the workflow lives in a Hub space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContextPaths {
    space_path: RelPath,
    workflow_path: RelPath,
}

impl ContextPaths {
    /// Create context paths
    ///
    /// Both paths are normalized.
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] if the workflow is not
    /// inside the space or either path climbs above the mount point root
    pub fn new(space_path: RelPath, workflow_path: RelPath) -> Result<Self, ResolutionError> {
        let space_path = space_path.normalize();
        let workflow_path = workflow_path.normalize();
        if space_path.leaves_scope() || workflow_path.leaves_scope() {
            return Err(ResolutionError::InvalidContext(format!(
                "context paths '{space_path}' and '{workflow_path}' leave the mount point"
            )));
        }
        if !workflow_path.starts_with(&space_path) {
            return Err(ResolutionError::InvalidContext(format!(
                "workflow '{workflow_path}' is not inside space '{space_path}'"
            )));
        }
        Ok(Self {
            space_path,
            workflow_path,
        })
    }

    /// Context paths of a workflow that is not in a Hub space
    ///
    /// # Errors
    /// Same as [`ContextPaths::new`]
    pub fn without_space(workflow_path: RelPath) -> Result<Self, ResolutionError> {
        Self::new(RelPath::root(), workflow_path)
    }

    /// Path of the space, empty outside Hub spaces
    #[inline]
    #[must_use]
    pub fn space_path(&self) -> &RelPath {
        &self.space_path
    }

    /// Path of the workflow
    #[inline]
    #[must_use]
    pub fn workflow_path(&self) -> &RelPath {
        &self.workflow_path
    }
}

/// Result of resolving a `knime://` URL
///
/// Built once by a resolver with the `with_*` methods; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrl {
    mount_id: Option<String>,
    path: Option<RelPath>,
    version: Option<ItemVersion>,
    path_inside_workflow: Option<RelPath>,
    resource_url: Url,
    cannot_be_relativized: bool,
}

impl ResolvedUrl {
    /// Result pointing at `resource_url` with no symbolic information
    #[must_use]
    pub fn new(resource_url: Url) -> Self {
        Self {
            mount_id: None,
            path: None,
            version: None,
            path_inside_workflow: None,
            resource_url,
            cannot_be_relativized: false,
        }
    }

    /// Set mount id and path from the mount point root
    #[must_use]
    pub fn with_item(mut self, mount_id: impl Into<String>, path: RelPath) -> Self {
        self.mount_id = Some(mount_id.into());
        self.path = Some(path);
        self
    }

    /// Set the item version; the current state is stored as none
    #[must_use]
    pub fn with_version(mut self, version: Option<ItemVersion>) -> Self {
        self.version = version.filter(|v| !v.is_current_state());
        self
    }

    /// Mark the item as living in the current workflow
    #[must_use]
    pub fn with_path_inside_workflow(mut self, path: RelPath) -> Self {
        self.path_inside_workflow = Some(path);
        self
    }

    /// Mark the reference as not expressible relative to the context
    #[must_use]
    pub fn not_relativizable(mut self) -> Self {
        self.cannot_be_relativized = true;
        self
    }

    /// Mark the reference as relativizable only if `condition` holds
    #[must_use]
    pub fn relativizable_if(mut self, condition: bool) -> Self {
        self.cannot_be_relativized |= !condition;
        self
    }

    /// Mount id of the referenced item
    #[inline]
    #[must_use]
    pub fn mount_id(&self) -> Option<&str> {
        self.mount_id.as_deref()
    }

    /// Path of the referenced item from the mount point root
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&RelPath> {
        self.path.as_ref()
    }

    /// Item version
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&ItemVersion> {
        self.version.as_ref()
    }

    /// Path inside the current workflow, if the item lives there
    #[inline]
    #[must_use]
    pub fn path_inside_workflow(&self) -> Option<&RelPath> {
        self.path_inside_workflow.as_ref()
    }

    /// Concrete, fetchable URL
    #[inline]
    #[must_use]
    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    /// Consume into the concrete URL
    #[inline]
    #[must_use]
    pub fn into_resource_url(self) -> Url {
        self.resource_url
    }

    /// Whether the reference crosses mount points or is opaque
    #[inline]
    #[must_use]
    pub fn cannot_be_relativized(&self) -> bool {
        self.cannot_be_relativized
    }
}
