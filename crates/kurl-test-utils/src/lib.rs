//! Testing utilities for kurl workspace
//!
//! Fixture execution contexts for every deployment variant.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use kurl_core::{ItemVersion, KnimeUrl, RelPath};
use kurl_resolver::{
    ExecutionContext, ExecutorInfo, HubExecutorContext, HubSpaceLocation, KnimeUrlResolver,
    LocalContext, MountpointInfo, RemoteEditorContext, RestLocation, Restriction,
    ResolverConfig, ServerExecutorContext, ServerLocation, TempCopyContext, VirtualNodeContext,
};
use url::Url;

pub const HUB_REPOSITORY: &str = "https://api.example.com/knime/rest/v4/repository";
pub const HUB_MOUNT_ID: &str = "My-Hub";
pub const HUB_SPACE: &str = "Users/john/Private";
pub const HUB_WORKFLOW: &str = "Users/john/Private/folder/workflow";

pub const SERVER_REPOSITORY: &str = "http://localhost:8080/knime/rest/v4/repository";
pub const SERVER_MOUNT_ID: &str = "My-Server";
pub const SERVER_WORKFLOW: &str = "group/workflow";

pub const LOCAL_MOUNT_ID: &str = "LOCAL";

/// Root of the local workspace mount point
pub fn local_root() -> PathBuf {
    std::env::temp_dir().join("kurl-workspace")
}

/// Local workflow inside [`local_root`]
pub fn local_workflow_dir() -> PathBuf {
    local_root().join("group").join("workflow")
}

/// Executor's local copy of a remote workflow
pub fn job_dir() -> PathBuf {
    std::env::temp_dir().join("kurl-job").join("workflow")
}

fn executor() -> ExecutorInfo {
    ExecutorInfo {
        local_workflow_path: job_dir(),
    }
}

fn hub_location(space: &str, workflow: &str, item_version: Option<ItemVersion>) -> HubSpaceLocation {
    HubSpaceLocation {
        repository_address: Url::parse(HUB_REPOSITORY).unwrap(),
        default_mount_id: HUB_MOUNT_ID.into(),
        space_path: RelPath::from(space),
        workflow_path: RelPath::from(workflow),
        item_version,
    }
}

fn server_location() -> ServerLocation {
    ServerLocation {
        repository_address: Url::parse(SERVER_REPOSITORY).unwrap(),
        default_mount_id: SERVER_MOUNT_ID.into(),
        workflow_path: RelPath::from(SERVER_WORKFLOW),
    }
}

pub fn local_context() -> ExecutionContext {
    ExecutionContext::AnalyticsPlatformLocal(LocalContext {
        local_workflow_path: local_workflow_dir(),
        mountpoint: Some(MountpointInfo {
            mount_id: LOCAL_MOUNT_ID.into(),
            root: local_root(),
        }),
    })
}

/// Local workflow extracted from a `.knwf` file, outside any mount point
pub fn knwf_context() -> ExecutionContext {
    ExecutionContext::AnalyticsPlatformLocal(LocalContext {
        local_workflow_path: local_workflow_dir(),
        mountpoint: None,
    })
}

pub fn hub_executor_context() -> ExecutionContext {
    hub_executor_context_at(HUB_SPACE, HUB_WORKFLOW, None)
}

pub fn hub_executor_context_at(
    space: &str,
    workflow: &str,
    item_version: Option<ItemVersion>,
) -> ExecutionContext {
    ExecutionContext::HubExecutor(HubExecutorContext {
        executor: executor(),
        location: hub_location(space, workflow, item_version),
    })
}

pub fn server_executor_context() -> ExecutionContext {
    ExecutionContext::ServerExecutor(ServerExecutorContext {
        executor: executor(),
        location: server_location(),
    })
}

/// Hub workflow in a temp copy, opened from mount point [`LOCAL_MOUNT_ID`]
/// if `from_mountpoint` is set
pub fn temp_copy_hub_context(from_mountpoint: bool) -> ExecutionContext {
    ExecutionContext::AnalyticsPlatformTempCopy(TempCopyContext {
        executor: executor(),
        location: RestLocation::Hub(hub_location(HUB_SPACE, HUB_WORKFLOW, None)),
        mountpoint_uri: from_mountpoint.then(|| {
            KnimeUrl::mountpoint_absolute(LOCAL_MOUNT_ID, RelPath::from(HUB_WORKFLOW), None)
        }),
    })
}

pub fn temp_copy_server_context() -> ExecutionContext {
    ExecutionContext::AnalyticsPlatformTempCopy(TempCopyContext {
        executor: executor(),
        location: RestLocation::Server(server_location()),
        mountpoint_uri: None,
    })
}

pub fn remote_hub_editor_context() -> ExecutionContext {
    ExecutionContext::RemoteExecutorEditor(RemoteEditorContext {
        mountpoint_uri: KnimeUrl::mountpoint_absolute(
            HUB_MOUNT_ID,
            RelPath::from(HUB_WORKFLOW),
            None,
        ),
        hub_space: Some(hub_location(HUB_SPACE, HUB_WORKFLOW, None)),
    })
}

pub fn remote_server_editor_context() -> ExecutionContext {
    ExecutionContext::RemoteExecutorEditor(RemoteEditorContext {
        mountpoint_uri: KnimeUrl::mountpoint_absolute(
            SERVER_MOUNT_ID,
            RelPath::from(SERVER_WORKFLOW),
            None,
        ),
        hub_space: None,
    })
}

pub fn virtual_context(
    delegate: ExecutionContext,
    restrictions: &[Restriction],
    virtual_data_area: Option<PathBuf>,
) -> ExecutionContext {
    ExecutionContext::VirtualNode(VirtualNodeContext {
        delegate: Box::new(delegate),
        restrictions: restrictions.iter().copied().collect::<BTreeSet<_>>(),
        virtual_data_area,
    })
}

/// Every non-virtual context with a mount point
pub fn mounted_contexts() -> Vec<ExecutionContext> {
    vec![
        local_context(),
        temp_copy_hub_context(true),
        temp_copy_hub_context(false),
        temp_copy_server_context(),
        hub_executor_context(),
        server_executor_context(),
        remote_hub_editor_context(),
        remote_server_editor_context(),
    ]
}

pub fn resolver(context: &ExecutionContext) -> KnimeUrlResolver {
    KnimeUrlResolver::for_context(Some(context), &ResolverConfig::default()).unwrap()
}

pub fn contextless_resolver() -> KnimeUrlResolver {
    KnimeUrlResolver::for_context(None, &ResolverConfig::default()).unwrap()
}
