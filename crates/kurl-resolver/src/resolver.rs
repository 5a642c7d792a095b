//! Resolver selection and the public resolution operations
//!
//! [`KnimeUrlResolver`] is chosen once from the execution context and then
//! routes every URL to the strategy operation of its category.

use std::collections::BTreeMap;

use kurl_core::{ContextPaths, KnimeUrl, ResolutionError, ResolvedUrl, UrlCategory};
use url::Url;

use crate::config::ResolverConfig;
use crate::context::{ExecutionContext, NodeContext};
use crate::strategies::{
    ContextlessResolver, HubExecutorResolver, LocalResolver, RemoteExecutorResolver,
    ServerExecutorResolver, TempCopyResolver, VirtualNodeResolver,
};
use crate::strategy::ResolveStrategy;

/// Resolver for one execution context
///
/// # Example
///
/// ```
/// use kurl_resolver::{KnimeUrlResolver, ResolverConfig};
///
/// let resolver = KnimeUrlResolver::for_context(None, &ResolverConfig::default())?;
/// let url = resolver.resolve("knime://LOCAL/data/x.csv", None)?;
/// assert_eq!(url.as_str(), "knime://LOCAL/data/x.csv");
/// # Ok::<(), kurl_core::ResolutionError>(())
/// ```
#[derive(Debug, Clone)]
pub enum KnimeUrlResolver {
    /// No workflow context
    Contextless(ContextlessResolver),
    /// Workflow in a local workspace
    Local(LocalResolver),
    /// Remote workflow opened as a local temp copy
    TempCopy(TempCopyResolver),
    /// Job on a Hub executor
    HubExecutor(HubExecutorResolver),
    /// Job on a Server executor
    ServerExecutor(ServerExecutorResolver),
    /// Local editor of a remotely executed workflow
    RemoteExecutor(RemoteExecutorResolver),
    /// Sandbox around one of the others
    VirtualNode(VirtualNodeResolver),
}

impl KnimeUrlResolver {
    /// Select the resolver for `context`
    ///
    /// # Errors
    /// Returns [`ResolutionError::InvalidContext`] for inconsistent
    /// descriptors, including a virtual node context wrapping another one
    pub fn for_context(
        context: Option<&ExecutionContext>,
        config: &ResolverConfig,
    ) -> Result<Self, ResolutionError> {
        let Some(context) = context else {
            tracing::debug!("No execution context, using contextless resolver");
            return Ok(Self::Contextless(ContextlessResolver::new(config)));
        };
        tracing::debug!("Selecting resolver for {} context", context.kind());

        Ok(match context {
            ExecutionContext::AnalyticsPlatformLocal(local) => {
                Self::Local(LocalResolver::new(local, config)?)
            }
            ExecutionContext::AnalyticsPlatformTempCopy(temp) => {
                Self::TempCopy(TempCopyResolver::new(temp, config)?)
            }
            ExecutionContext::HubExecutor(hub) => {
                Self::HubExecutor(HubExecutorResolver::new(hub, config)?)
            }
            ExecutionContext::ServerExecutor(server) => {
                Self::ServerExecutor(ServerExecutorResolver::new(server, config)?)
            }
            ExecutionContext::RemoteExecutorEditor(remote) => {
                Self::RemoteExecutor(RemoteExecutorResolver::new(remote, config)?)
            }
            ExecutionContext::VirtualNode(virtual_node) => {
                if matches!(*virtual_node.delegate, ExecutionContext::VirtualNode(_)) {
                    return Err(ResolutionError::InvalidContext(
                        "virtual node contexts cannot be nested".to_string(),
                    ));
                }
                let delegate = Self::for_context(Some(&virtual_node.delegate), config)?;
                Self::VirtualNode(VirtualNodeResolver::new(
                    delegate,
                    virtual_node.restrictions.clone(),
                    virtual_node.virtual_data_area.clone(),
                ))
            }
        })
    }

    /// The strategy behind this resolver
    #[must_use]
    pub fn strategy(&self) -> &dyn ResolveStrategy {
        match self {
            Self::Contextless(s) => s,
            Self::Local(s) => s,
            Self::TempCopy(s) => s,
            Self::HubExecutor(s) => s,
            Self::ServerExecutor(s) => s,
            Self::RemoteExecutor(s) => s,
            Self::VirtualNode(s) => s,
        }
    }

    /// Strategy name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.strategy().name()
    }

    /// Space and workflow location, if known
    #[inline]
    #[must_use]
    pub fn context_paths(&self) -> Option<&ContextPaths> {
        self.strategy().context_paths()
    }

    /// Resolve `url` to a concrete URL
    ///
    /// `node` is only consulted for node-relative URLs.
    ///
    /// # Errors
    /// [`ResolutionError::NotAKnimeUrl`] for other schemes, otherwise any
    /// failure of the strategy
    pub fn resolve(&self, url: &str, node: Option<&NodeContext>) -> Result<Url, ResolutionError> {
        self.resolve_details(url, node)
            .map(ResolvedUrl::into_resource_url)
    }

    /// Resolve `url` and keep the symbolic details of the result
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve)
    pub fn resolve_details(
        &self,
        url: &str,
        node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        self.resolve_knime_url(&KnimeUrl::parse(url)?, node)
    }

    /// Resolve an already parsed URL
    ///
    /// # Errors
    /// Any failure of the strategy; versioned node-relative URLs are always
    /// rejected
    pub fn resolve_knime_url(
        &self,
        url: &KnimeUrl,
        node: Option<&NodeContext>,
    ) -> Result<ResolvedUrl, ResolutionError> {
        let strategy = self.strategy();
        let path = url.path();
        let version = url.version().copied();
        tracing::debug!("Resolving '{}' ({}) with {} resolver", url, url.category(), strategy.name());

        let resolved = match url.category() {
            UrlCategory::MountpointAbsolute => {
                strategy.resolve_mountpoint_absolute(url, url.authority(), path, version)
            }
            UrlCategory::MountpointRelative => strategy.resolve_mountpoint_relative(url, path, version),
            UrlCategory::HubSpaceRelative => strategy.resolve_space_relative(url, path, version),
            UrlCategory::WorkflowRelative => strategy.resolve_workflow_relative(url, path, version),
            UrlCategory::NodeRelative => {
                if version.is_some() {
                    return Err(ResolutionError::versioning_not_supported(
                        url,
                        "for node relative URLs",
                    ));
                }
                strategy.resolve_node_relative(url, path, node)
            }
        }?;

        tracing::debug!("Resolved '{}' to '{}'", url, resolved.resource_url());
        Ok(resolved)
    }

    /// Mountpoint-absolute form of `url`
    ///
    /// Returns `None` if the target has no stable absolute path, e.g. it
    /// lives inside the current workflow or was resolved from a node.
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve)
    pub fn resolve_to_absolute(
        &self,
        url: &str,
        node: Option<&NodeContext>,
    ) -> Result<Option<KnimeUrl>, ResolutionError> {
        let resolved = self.resolve_details(url, node)?;
        Ok(absolute_form(&resolved))
    }

    /// Every symbolic form under which `url` can be written in this context
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve)
    pub fn change_link_type(
        &self,
        url: &str,
        node: Option<&NodeContext>,
    ) -> Result<BTreeMap<UrlCategory, KnimeUrl>, ResolutionError> {
        let input = KnimeUrl::parse(url)?;
        let resolved = self.resolve_knime_url(&input, node)?;
        let version = input.version().copied();

        let mut forms = BTreeMap::new();
        if input.category() == UrlCategory::NodeRelative {
            forms.insert(UrlCategory::NodeRelative, input.clone());
        }
        if let Some(absolute) = absolute_form(&resolved) {
            forms.insert(UrlCategory::MountpointAbsolute, absolute);
        }

        let base = self
            .context_paths()
            .zip(resolved.path())
            .filter(|_| !resolved.cannot_be_relativized());
        if let Some((paths, path)) = base {
            forms.insert(
                UrlCategory::WorkflowRelative,
                KnimeUrl::workflow_relative(path.relative_to(paths.workflow_path()), version),
            );
            if resolved.path_inside_workflow().is_none() {
                if let Some(in_space) = path.strip_prefix(paths.space_path()) {
                    forms.insert(
                        UrlCategory::MountpointRelative,
                        KnimeUrl::mountpoint_relative(in_space.clone(), version),
                    );
                    forms.insert(
                        UrlCategory::HubSpaceRelative,
                        KnimeUrl::space_relative(in_space, version),
                    );
                }
            }
        }
        Ok(forms)
    }
}

fn absolute_form(resolved: &ResolvedUrl) -> Option<KnimeUrl> {
    if resolved.path_inside_workflow().is_some() {
        return None;
    }
    let (mount_id, path) = (resolved.mount_id()?, resolved.path()?);
    Some(KnimeUrl::mountpoint_absolute(
        mount_id,
        path.clone(),
        resolved.version().copied(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        ExecutorInfo, HubExecutorContext, HubSpaceLocation, LocalContext, MountpointInfo,
        Restriction, VirtualNodeContext,
    };
    use kurl_core::{ItemVersion, RelPath};
    use std::collections::BTreeSet;

    fn hub_context() -> ExecutionContext {
        ExecutionContext::HubExecutor(HubExecutorContext {
            executor: ExecutorInfo {
                local_workflow_path: std::env::temp_dir().join("job").join("workflow"),
            },
            location: HubSpaceLocation {
                repository_address: Url::parse("https://api.example.com/knime/rest/v4/repository")
                    .unwrap(),
                default_mount_id: "My-Hub".into(),
                space_path: RelPath::from("Users/john/Private"),
                workflow_path: RelPath::from("Users/john/Private/folder/workflow"),
                item_version: None,
            },
        })
    }

    fn hub() -> KnimeUrlResolver {
        KnimeUrlResolver::for_context(Some(&hub_context()), &ResolverConfig::default()).unwrap()
    }

    #[test]
    fn selects_strategy_by_context() {
        assert_eq!(hub().name(), "hub-executor");
        let contextless = KnimeUrlResolver::for_context(None, &ResolverConfig::default()).unwrap();
        assert_eq!(contextless.name(), "contextless");
        assert!(contextless.context_paths().is_none());
    }

    #[test]
    fn nested_virtual_contexts_are_invalid() {
        let inner = ExecutionContext::VirtualNode(VirtualNodeContext {
            delegate: Box::new(hub_context()),
            restrictions: BTreeSet::new(),
            virtual_data_area: None,
        });
        let outer = ExecutionContext::VirtualNode(VirtualNodeContext {
            delegate: Box::new(inner),
            restrictions: BTreeSet::from([Restriction::WorkflowDataAreaAccess]),
            virtual_data_area: None,
        });
        assert!(matches!(
            KnimeUrlResolver::for_context(Some(&outer), &ResolverConfig::default()),
            Err(ResolutionError::InvalidContext(_))
        ));
    }

    #[test]
    fn other_schemes_are_not_knime_urls() {
        let err = hub().resolve("https://example.com/x", None).unwrap_err();
        assert!(matches!(err, ResolutionError::NotAKnimeUrl { .. }));
    }

    #[test]
    fn versioned_node_relative_is_rejected() {
        let node = NodeContext::saved("/ws/wf", "/ws/wf/node");
        let err = hub()
            .resolve("knime://knime.node/x?version=2", Some(&node))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::VersioningNotSupported { .. }));
    }

    #[test]
    fn absolute_form_of_neighbour() {
        let absolute = hub()
            .resolve_to_absolute("knime://knime.workflow/../other/x.csv?version=3", None)
            .unwrap();
        assert_eq!(
            absolute.map(|u| u.to_string()).as_deref(),
            Some("knime://My-Hub/Users/john/Private/folder/other/x.csv?version=3")
        );
    }

    #[test]
    fn absolute_form_inside_workflow_is_none() {
        let absolute = hub()
            .resolve_to_absolute("knime://knime.workflow/data/x.csv", None)
            .unwrap();
        assert!(absolute.is_none());
    }

    #[test]
    fn link_types_inside_workflow() {
        let forms = hub()
            .change_link_type("knime://knime.space/folder/workflow/data/x.csv", None)
            .unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(
            forms[&UrlCategory::WorkflowRelative].to_string(),
            "knime://knime.workflow/data/x.csv"
        );
    }

    #[test]
    fn link_types_keep_version() {
        let forms = hub()
            .change_link_type("knime://knime.space/other/x.csv?version=most-recent", None)
            .unwrap();
        assert_eq!(
            forms[&UrlCategory::WorkflowRelative].version(),
            Some(&ItemVersion::MostRecent)
        );
        assert_eq!(
            forms[&UrlCategory::HubSpaceRelative].to_string(),
            "knime://knime.space/other/x.csv?version=most-recent"
        );
    }

    #[test]
    fn local_link_types_without_mountpoint() {
        let context = ExecutionContext::AnalyticsPlatformLocal(LocalContext {
            local_workflow_path: std::env::temp_dir().join("standalone"),
            mountpoint: None,
        });
        let resolver =
            KnimeUrlResolver::for_context(Some(&context), &ResolverConfig::default()).unwrap();
        let forms = resolver
            .change_link_type("knime://knime.workflow/data/x.csv", None)
            .unwrap();
        assert!(forms.is_empty());

        let context = ExecutionContext::AnalyticsPlatformLocal(LocalContext {
            local_workflow_path: std::env::temp_dir().join("ws").join("group").join("wf"),
            mountpoint: Some(MountpointInfo {
                mount_id: "LOCAL".into(),
                root: std::env::temp_dir().join("ws"),
            }),
        });
        let resolver =
            KnimeUrlResolver::for_context(Some(&context), &ResolverConfig::default()).unwrap();
        let forms = resolver
            .change_link_type("knime://LOCAL/other/x.csv", None)
            .unwrap();
        assert_eq!(
            forms[&UrlCategory::WorkflowRelative].to_string(),
            "knime://knime.workflow/../../other/x.csv"
        );
        assert_eq!(
            forms[&UrlCategory::MountpointRelative].to_string(),
            "knime://knime.mountpoint/other/x.csv"
        );
    }
}
