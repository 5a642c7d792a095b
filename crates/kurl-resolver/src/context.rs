//! Execution context descriptors
//!
//! An [`ExecutionContext`] describes where the current workflow runs and
//! where it is stored. Exactly one variant applies per workflow run; the
//! resolver chooses its strategy from it once, at construction.
//!
//! All descriptors are plain serde data so a context can be loaded from a
//! TOML or JSON file:
//!
//! ```toml
//! type = "hub-executor"
//!
//! [executor]
//! local-workflow-path = "/tmp/job-1234/workflow"
//!
//! [location]
//! repository-address = "https://api.hub.example.com/repository"
//! default-mount-id = "My-Hub"
//! space-path = "/Users/john/Private"
//! workflow-path = "/Users/john/Private/folder/workflow"
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use kurl_core::{
    file_url, ItemVersion, KnimeUrl, RelPath, ResolutionError, ResolvedUrl, Scope, UrlCategory,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where and how the current workflow runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExecutionContext {
    /// Workflow stored and executed in a local Analytics Platform
    AnalyticsPlatformLocal(LocalContext),
    /// Remote workflow opened as a local temporary copy
    AnalyticsPlatformTempCopy(TempCopyContext),
    /// Job on a Hub executor
    HubExecutor(HubExecutorContext),
    /// Job on a Server executor
    ServerExecutor(ServerExecutorContext),
    /// Local dialogs of a workflow running on a remote executor
    RemoteExecutorEditor(RemoteEditorContext),
    /// Sandboxed node execution wrapping another context
    VirtualNode(VirtualNodeContext),
}

impl ExecutionContext {
    /// Short name of the variant
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AnalyticsPlatformLocal(_) => "analytics-platform-local",
            Self::AnalyticsPlatformTempCopy(_) => "analytics-platform-temp-copy",
            Self::HubExecutor(_) => "hub-executor",
            Self::ServerExecutor(_) => "server-executor",
            Self::RemoteExecutorEditor(_) => "remote-executor-editor",
            Self::VirtualNode(_) => "virtual-node",
        }
    }
}

/// Local mount point holding the workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MountpointInfo {
    /// Mount id, e.g. `LOCAL`
    pub mount_id: String,
    /// Root directory of the mount point
    pub root: PathBuf,
}

/// Local copy of the workflow an executor works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExecutorInfo {
    /// Directory of the local workflow copy
    pub local_workflow_path: PathBuf,
}

/// Workflow stored in a Hub space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HubSpaceLocation {
    /// REST repository endpoint
    pub repository_address: Url,
    /// Mount id the Hub is known under by default
    pub default_mount_id: String,
    /// Path of the space from the Hub root
    pub space_path: RelPath,
    /// Path of the workflow from the Hub root
    pub workflow_path: RelPath,
    /// Version of the workflow being run, if not its current state
    #[serde(default)]
    pub item_version: Option<ItemVersion>,
}

/// Workflow stored in a Server repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerLocation {
    /// REST repository endpoint
    pub repository_address: Url,
    /// Mount id the Server is known under by default
    pub default_mount_id: String,
    /// Path of the workflow from the repository root
    pub workflow_path: RelPath,
}

/// Remote repository a workflow comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RestLocation {
    /// Hub space
    Hub(HubSpaceLocation),
    /// Server repository
    Server(ServerLocation),
}

/// See [`ExecutionContext::AnalyticsPlatformLocal`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalContext {
    /// Directory of the workflow
    pub local_workflow_path: PathBuf,
    /// Mount point containing the workflow; absent for extracted `.knwf` files
    #[serde(default)]
    pub mountpoint: Option<MountpointInfo>,
}

/// See [`ExecutionContext::AnalyticsPlatformTempCopy`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TempCopyContext {
    /// Temporary local copy
    pub executor: ExecutorInfo,
    /// Repository the workflow was downloaded from
    pub location: RestLocation,
    /// `knime://<local mount id>/<path>` of the workflow, if it is mounted locally
    #[serde(default)]
    pub mountpoint_uri: Option<KnimeUrl>,
}

/// See [`ExecutionContext::HubExecutor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HubExecutorContext {
    /// Job's local copy of the workflow
    pub executor: ExecutorInfo,
    /// Where the workflow is stored
    pub location: HubSpaceLocation,
}

/// See [`ExecutionContext::ServerExecutor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerExecutorContext {
    /// Job's local copy of the workflow
    pub executor: ExecutorInfo,
    /// Where the workflow is stored
    pub location: ServerLocation,
}

/// See [`ExecutionContext::RemoteExecutorEditor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteEditorContext {
    /// `knime://<mount id>/<path>` of the remote workflow
    pub mountpoint_uri: KnimeUrl,
    /// Hub space of the workflow; absent for Server workflows
    #[serde(default)]
    pub hub_space: Option<HubSpaceLocation>,
}

/// Resource class a virtual node context may deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Restriction {
    /// Any workflow-relative URL
    WorkflowRelativeResourceAccess,
    /// The workflow's `data` directory
    WorkflowDataAreaAccess,
}

/// See [`ExecutionContext::VirtualNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VirtualNodeContext {
    /// Context of the surrounding workflow; must not be virtual itself
    pub delegate: Box<ExecutionContext>,
    /// Denied resource classes
    #[serde(default)]
    pub restrictions: BTreeSet<Restriction>,
    /// Directory standing in for the workflow's data area
    #[serde(default)]
    pub virtual_data_area: Option<PathBuf>,
}

/// Node a node-relative URL is resolved against
///
/// Supplied by the caller per resolution; directories are absent until the
/// workflow has been saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeContext {
    workflow_dir: Option<PathBuf>,
    node_dir: Option<PathBuf>,
}

impl NodeContext {
    /// Node of a saved workflow
    #[must_use]
    pub fn saved(workflow_dir: impl Into<PathBuf>, node_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflow_dir: Some(workflow_dir.into()),
            node_dir: Some(node_dir.into()),
        }
    }

    /// Node of a workflow that was never saved
    #[must_use]
    pub fn unsaved() -> Self {
        Self::default()
    }

    /// Whether the node has a directory on disk
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.workflow_dir.is_some() && self.node_dir.is_some()
    }

    /// Resolve `path` against the node directory, staying in the workflow
    pub(crate) fn resolve(&self, url: &KnimeUrl, path: &RelPath) -> Result<ResolvedUrl, ResolutionError> {
        let (Some(workflow_dir), Some(node_dir)) = (&self.workflow_dir, &self.node_dir) else {
            return Err(ResolutionError::WorkflowNotSaved {
                url: url.to_string(),
            });
        };

        let node_path = node_dir
            .strip_prefix(workflow_dir)
            .map_err(|_| {
                ResolutionError::InvalidContext(format!(
                    "node directory '{}' is not inside workflow '{}'",
                    node_dir.display(),
                    workflow_dir.display()
                ))
            })
            .and_then(|relative| {
                RelPath::from_local(relative).map_err(|e| ResolutionError::InvalidContext(e.to_string()))
            })?;

        let inside = node_path.append_within(path, &RelPath::root()).map_err(|_| {
            ResolutionError::ScopeViolation {
                scope: Scope::Workflow,
                category: UrlCategory::NodeRelative,
                path: node_path.join(path).normalize().to_string(),
                root: workflow_dir.display().to_string(),
            }
        })?;

        Ok(ResolvedUrl::new(file_url(&inside.to_local(workflow_dir))?).not_relativizable())
    }
}
