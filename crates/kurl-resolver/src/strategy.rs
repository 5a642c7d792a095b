//! Resolution strategy contract
//!
//! Provides the [`ResolveStrategy`] trait every execution-context specific
//! resolver implements.

use kurl_core::{ContextPaths, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl};

use crate::context::NodeContext;

/// Resolution of the five URL categories for one execution context
///
/// # Contract
/// - `path` is the decoded, unnormalized path of `url`; implementations
///   normalize it and keep the result inside the applicable root (mount
///   point, Hub space or workflow). A leading `..` widens the root from the
///   workflow to the space, it never lifts containment.
/// - Violations are reported as [`ResolutionError::ScopeViolation`], never
///   clamped.
/// - Implementations hold no mutable state; calls may run concurrently.
pub trait ResolveStrategy: Send + Sync + std::fmt::Debug {
    /// Resolve `knime://<mount_id>/<path>`
    ///
    /// # Errors
    /// Scope, version and mount id failures of the context
    fn resolve_mountpoint_absolute(
        &self,
        url: &KnimeUrl,
        mount_id: &str,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError>;

    /// Resolve `knime://knime.mountpoint/<path>`
    ///
    /// # Errors
    /// Scope and version failures of the context
    fn resolve_mountpoint_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError>;

    /// Resolve `knime://knime.space/<path>`
    ///
    /// # Errors
    /// Scope and version failures of the context
    fn resolve_space_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError>;

    /// Resolve `knime://knime.workflow/<path>`
    ///
    /// # Errors
    /// Scope, version and sandbox failures of the context
    fn resolve_workflow_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        version: Option<ItemVersion>,
    ) -> Result<ResolvedUrl, ResolutionError>;

    /// Resolve `knime://knime.node/<path>` against the caller's node
    ///
    /// # Errors
    /// Missing or unsaved node, scope and sandbox failures
    fn resolve_node_relative(
        &self,
        url: &KnimeUrl,
        path: &RelPath,
        node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError>;

    /// Space and workflow location, if the context has a mount point
    fn context_paths(&self) -> Option<&ContextPaths>;

    /// Location inside the current workflow that the workflow-relative
    /// `path` addresses, `None` if it ends up outside
    fn workflow_item(&self, path: &RelPath) -> Option<RelPath> {
        let workflow = self.context_paths()?.workflow_path();
        workflow.join(path).normalize().strip_prefix(workflow)
    }

    /// Strategy name (for logging)
    fn name(&self) -> &'static str;
}
