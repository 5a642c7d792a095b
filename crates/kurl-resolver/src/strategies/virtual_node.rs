//! Sandboxed node execution

use std::collections::BTreeSet;
use std::path::PathBuf;

use kurl_core::{
    file_url, ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl,
};

use crate::context::{NodeContext, Restriction};
use crate::resolver::KnimeUrlResolver;
use crate::strategy::ResolveStrategy;

/// Reserved data directory of a workflow
const DATA_DIR: &str = "data";

/// Wraps the resolver of the surrounding workflow and applies a sandbox
///
/// Only workflow-relative URLs are intercepted: references into the
/// workflow's `data` directory are redirected to the virtual data area or
/// rejected, and all workflow-relative access may be denied. Node-relative
/// URLs are never supported.
#[derive(Debug, Clone)]
pub struct VirtualNodeResolver {
    delegate: Box<KnimeUrlResolver>,
    restrictions: BTreeSet<Restriction>,
    virtual_data_area: Option<PathBuf>,
}

impl VirtualNodeResolver {
    /// Wrap `delegate`
    #[must_use]
    pub fn new(
        delegate: KnimeUrlResolver,
        restrictions: BTreeSet<Restriction>,
        virtual_data_area: Option<PathBuf>,
    ) -> Self {
        Self {
            delegate: Box::new(delegate),
            restrictions,
            virtual_data_area,
        }
    }

    /// Resolver of the surrounding workflow
    #[inline]
    #[must_use]
    pub fn delegate(&self) -> &KnimeUrlResolver {
        &self.delegate
    }

    fn restricts(&self, restriction: Restriction) -> bool {
        self.restrictions.contains(&restriction)
    }

    fn guards_data_area(&self) -> bool {
        self.virtual_data_area.is_some() || self.restricts(Restriction::WorkflowDataAreaAccess)
    }

    /// Path below the workflow's data directory, if a workflow-relative
    /// `path` points there
    fn data_area_suffix(&self, path: &RelPath) -> Option<RelPath> {
        self.workflow_item(path)?.strip_prefix(&RelPath::single(DATA_DIR))
    }

    /// Results of other categories must not be relativized into a guarded
    /// workflow-relative form
    fn guard(&self, resolved: ResolvedUrl) -> ResolvedUrl {
        let into_data_area = resolved
            .path_inside_workflow()
            .is_some_and(|inside| inside.first() == Some(DATA_DIR));
        if self.restricts(Restriction::WorkflowRelativeResourceAccess)
            || (into_data_area && self.guards_data_area())
        {
            resolved.not_relativizable()
        } else {
            resolved
        }
    }
}

impl ResolveStrategy for VirtualNodeResolver {
    fn resolve_mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.delegate
            .strategy()
            .resolve_mountpoint_absolute(url, mount_id, path, version)
            .map(|resolved| self.guard(resolved))
    }

    fn resolve_mountpoint_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.delegate
            .strategy()
            .resolve_mountpoint_relative(url, path, version)
            .map(|resolved| self.guard(resolved))
    }

    fn resolve_space_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.delegate
            .strategy()
            .resolve_space_relative(url, path, version)
            .map(|resolved| self.guard(resolved))
    }

    fn resolve_workflow_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        if let Some(suffix) = self.data_area_suffix(path) {
            if let Some(area) = &self.virtual_data_area {
                if version.is_some() {
                    return Err(ResolutionError::versioning_not_supported(
                        url,
                        "in the virtual data area",
                    ));
                }
                tracing::debug!("Redirecting '{}' to virtual data area '{}'", url, area.display());
                let inside = RelPath::single(DATA_DIR).join(&suffix);
                return Ok(ResolvedUrl::new(file_url(&suffix.to_local(area))?)
                    .with_path_inside_workflow(inside)
                    .not_relativizable());
            }
            if self.restricts(Restriction::WorkflowDataAreaAccess) {
                return Err(ResolutionError::DataAreaAccessDenied {
                    url: url.to_string(),
                });
            }
        }

        if self.restricts(Restriction::WorkflowRelativeResourceAccess) {
            return Err(ResolutionError::WorkflowRelativeAccessDenied {
                url: url.to_string(),
            });
        }

        self.delegate
            .strategy()
            .resolve_workflow_relative(url, path, version)
    }

    fn resolve_node_relative(
        &self,
        url: &KnimeUrl,
        _path: &RelPath,
        _node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        Err(ResolutionError::NodeRelativeNotSupported {
            url: url.to_string(),
            reason: "in a virtual node context".to_string(),
        })
    }

    fn context_paths(&self) -> Option<&ContextPaths> {
        self.delegate.context_paths()
    }

    fn workflow_item(&self, path: &RelPath) -> Option<RelPath> {
        self.delegate.strategy().workflow_item(path)
    }

    fn name(&self) -> &'static str {
        "virtual-node"
    }
}
