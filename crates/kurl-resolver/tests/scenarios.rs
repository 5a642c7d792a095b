use std::collections::BTreeMap;

use kurl_core::{ItemVersion, ResolutionError, Scope, UrlCategory};
use kurl_resolver::{
    ExecutionContext, ExternalMounts, KnimeUrlResolver, NodeContext, ResolverConfig, Restriction,
};
use kurl_test_utils::*;
use pretty_assertions::assert_eq;

fn link_types(resolver: &KnimeUrlResolver, url: &str) -> BTreeMap<UrlCategory, String> {
    resolver
        .change_link_type(url, None)
        .unwrap()
        .into_iter()
        .map(|(category, url)| (category, url.to_string()))
        .collect()
}

fn expected(forms: &[(UrlCategory, &str)]) -> BTreeMap<UrlCategory, String> {
    forms
        .iter()
        .map(|(category, url)| (*category, (*url).to_string()))
        .collect()
}

#[test]
fn workflow_relative_parent_uses_path_semantics() {
    let resolver = resolver(&hub_executor_context_at(
        "Team Space",
        "Team Space/Project/MyFlow",
        None,
    ));

    let resolved = resolver
        .resolve_details("knime://knime.workflow/../OtherWorkflow/data/x.csv", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().as_str(),
        format!("{HUB_REPOSITORY}/Team%20Space/Project/OtherWorkflow/data/x.csv:data")
    );
    assert_eq!(resolved.mount_id(), Some(HUB_MOUNT_ID));
    assert!(!resolved.cannot_be_relativized());

    let resolved = resolver
        .resolve_details("knime://knime.workflow/../../OtherWorkflow/data/x.csv", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().as_str(),
        format!("{HUB_REPOSITORY}/Team%20Space/OtherWorkflow/data/x.csv:data")
    );
    assert_eq!(resolved.mount_id(), Some(HUB_MOUNT_ID));
    assert!(!resolved.cannot_be_relativized());
}

#[test]
fn unsaved_node_fails_with_workflow_not_saved() {
    let err = resolver(&local_context())
        .resolve("knime://knime.node/../model.bin", Some(&NodeContext::unsaved()))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::WorkflowNotSaved { .. }));
}

#[test]
fn restricted_data_area_is_denied() {
    let context = virtual_context(
        hub_executor_context(),
        &[Restriction::WorkflowDataAreaAccess],
        None,
    );
    let err = resolver(&context)
        .resolve("knime://knime.workflow/data/input.csv", None)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::DataAreaAccessDenied { .. }));

    let other = resolver(&context)
        .resolve("knime://knime.workflow/other/input.csv", None)
        .unwrap();
    assert_eq!(
        other.to_file_path().unwrap(),
        job_dir().join("other").join("input.csv")
    );
}

#[test]
fn virtual_data_area_redirects() {
    let area = std::env::temp_dir().join("kurl-virtual-area");
    let context = virtual_context(
        local_context(),
        &[Restriction::WorkflowDataAreaAccess],
        Some(area.clone()),
    );
    let resolver = resolver(&context);

    let resolved = resolver
        .resolve_details("knime://knime.workflow/data/sub/input.csv", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().to_file_path().unwrap(),
        area.join("sub").join("input.csv")
    );
    assert!(resolved.cannot_be_relativized());

    let err = resolver
        .resolve("knime://knime.workflow/data/input.csv?version=2", None)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::VersioningNotSupported { .. }));

    // Absolute references into the data area must not become workflow-relative
    let forms = link_types(&resolver, "knime://LOCAL/group/workflow/data/x.csv");
    assert!(!forms.contains_key(&UrlCategory::WorkflowRelative));
}

#[test]
fn knwf_data_area_is_guarded_after_reentry() {
    let restricted = resolver(&virtual_context(
        knwf_context(),
        &[Restriction::WorkflowDataAreaAccess],
        None,
    ));
    for url in [
        "knime://knime.workflow/data/input.csv",
        "knime://knime.workflow/../workflow/data/input.csv",
        "knime://knime.workflow/other/../data/input.csv",
    ] {
        let err = restricted.resolve(url, None).unwrap_err();
        assert!(matches!(err, ResolutionError::DataAreaAccessDenied { .. }), "{url}: {err}");
    }
    assert_eq!(
        restricted
            .resolve("knime://knime.workflow/../workflow/other/input.csv", None)
            .unwrap()
            .to_file_path()
            .unwrap(),
        local_workflow_dir().join("other").join("input.csv")
    );

    let area = std::env::temp_dir().join("kurl-knwf-area");
    let redirected = resolver(&virtual_context(knwf_context(), &[], Some(area.clone())));
    let resolved = redirected
        .resolve_details("knime://knime.workflow/../workflow/data/input.csv", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().to_file_path().unwrap(),
        area.join("input.csv")
    );
    assert!(resolved.cannot_be_relativized());
}

#[test]
fn root_of_current_workflow_on_executors() {
    let hub = resolver(&hub_executor_context())
        .resolve_details("knime://knime.workflow/../workflow", None)
        .unwrap();
    assert_eq!(
        hub.resource_url().as_str(),
        format!("{HUB_REPOSITORY}/{HUB_WORKFLOW}:data")
    );
    assert!(hub.path_inside_workflow().is_none());

    let server = resolver(&server_executor_context())
        .resolve("knime://knime.workflow/../workflow", None)
        .unwrap();
    assert_eq!(server.as_str(), format!("{SERVER_REPOSITORY}/{SERVER_WORKFLOW}:data"));

    // files of the workflow still come from the job copy
    assert_eq!(
        resolver(&hub_executor_context())
            .resolve("knime://knime.workflow/data/../someDir/file.csv", None)
            .unwrap()
            .to_file_path()
            .unwrap(),
        job_dir().join("someDir").join("file.csv")
    );
}

#[test]
fn root_of_current_workflow_on_mountpoints() {
    let cases = [
        (temp_copy_hub_context(true), format!("knime://{LOCAL_MOUNT_ID}/{HUB_WORKFLOW}")),
        (remote_hub_editor_context(), format!("knime://{HUB_MOUNT_ID}/{HUB_WORKFLOW}")),
        (remote_server_editor_context(), format!("knime://{SERVER_MOUNT_ID}/{SERVER_WORKFLOW}")),
    ];
    for (context, expected) in cases {
        let resolver = resolver(&context);
        assert_eq!(
            resolver
                .resolve("knime://knime.workflow/../workflow", None)
                .unwrap()
                .as_str(),
            expected,
            "{}",
            resolver.name()
        );
    }
}

#[test]
fn root_of_current_workflow_locally() {
    for context in [local_context(), knwf_context()] {
        let resolved = resolver(&context)
            .resolve_details("knime://knime.workflow/../workflow", None)
            .unwrap();
        assert_eq!(resolved.resource_url().to_file_path().unwrap(), local_workflow_dir());
        assert_eq!(
            resolved.path_inside_workflow().map(|inside| inside.is_empty()),
            Some(true)
        );
    }
}

#[test]
fn virtual_context_denies_workflow_relative() {
    let context = virtual_context(
        hub_executor_context(),
        &[Restriction::WorkflowRelativeResourceAccess],
        None,
    );
    let resolver = resolver(&context);
    assert_eq!(resolver.name(), "virtual-node");

    let err = resolver
        .resolve("knime://knime.workflow/../x.txt", None)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::WorkflowRelativeAccessDenied { .. }));

    let space = resolver.resolve("knime://knime.space/x.txt", None).unwrap();
    assert_eq!(
        space.as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/x.txt:data")
    );
    assert_eq!(
        link_types(&resolver, "knime://knime.space/x.txt"),
        expected(&[(
            UrlCategory::MountpointAbsolute,
            "knime://My-Hub/Users/john/Private/x.txt"
        )])
    );

    let node = NodeContext::saved(job_dir(), job_dir().join("Node (#1)"));
    let err = resolver
        .resolve("knime://knime.node/x", Some(&node))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NodeRelativeNotSupported { .. }));
}

#[test]
fn hub_space_relative_and_escape() {
    let resolver = resolver(&hub_executor_context());
    assert_eq!(
        resolver
            .resolve("knime://knime.space/test.txt", None)
            .unwrap()
            .as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/test.txt:data")
    );
    assert_eq!(
        resolver
            .resolve("knime://knime.mountpoint/test.txt", None)
            .unwrap()
            .as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/test.txt:data")
    );

    let err = resolver
        .resolve("knime://knime.space/foo/../../test.txt", None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Leaving the Hub space is not allowed for space relative URLs: \
         'Users/john/test.txt' is not in 'Users/john/Private'"
    );
}

#[test]
fn hub_workflow_items_come_from_local_copy() {
    let resolver = resolver(&hub_executor_context());
    let resolved = resolver
        .resolve_details("knime://My-Hub/Users/john/Private/folder/workflow/data/x", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().to_file_path().unwrap(),
        job_dir().join("data").join("x")
    );
    assert_eq!(
        resolved.path_inside_workflow().map(ToString::to_string).as_deref(),
        Some("data/x")
    );

    let versioned = resolver_for_version(3)
        .resolve("knime://knime.workflow/data/x?version=3", None)
        .unwrap();
    assert_eq!(versioned.to_file_path().unwrap(), job_dir().join("data").join("x"));

    let other = resolver_for_version(3)
        .resolve("knime://knime.workflow/data/x?version=most-recent", None)
        .unwrap();
    assert_eq!(
        other.as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/folder/workflow/data/x:data?version=most-recent")
    );
}

fn resolver_for_version(version: u64) -> KnimeUrlResolver {
    resolver(&hub_executor_context_at(
        HUB_SPACE,
        HUB_WORKFLOW,
        Some(ItemVersion::Specific(version)),
    ))
}

#[test]
fn hub_item_ids_are_opaque() {
    let resolver = resolver(&hub_executor_context());
    let resolved = resolver
        .resolve_details("knime://My-Hub/*02a7f8b?version=2", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().as_str(),
        format!("{HUB_REPOSITORY}/*02a7f8b:data?version=2")
    );
    assert!(resolved.cannot_be_relativized());
    assert_eq!(
        link_types(&resolver, "knime://My-Hub/*02a7f8b?version=2"),
        expected(&[(UrlCategory::MountpointAbsolute, "knime://My-Hub/*02a7f8b?version=2")])
    );
}

#[test]
fn hub_outside_space_is_not_relativizable() {
    let resolver = resolver(&hub_executor_context());
    let resolved = resolver
        .resolve_details("knime://My-Hub/Users/jane/Public/x.txt", None)
        .unwrap();
    assert_eq!(
        resolved.resource_url().as_str(),
        format!("{HUB_REPOSITORY}/Users/jane/Public/x.txt:data")
    );
    assert!(resolved.cannot_be_relativized());
}

#[test]
fn legacy_space_version_is_migrated() {
    let url = resolver(&hub_executor_context())
        .resolve("knime://knime.space/x.txt?spaceVersion=5", None)
        .unwrap();
    assert_eq!(
        url.as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/x.txt:data?version=5")
    );
}

#[test]
fn neighbour_link_types() {
    let resolver = resolver(&hub_executor_context());
    assert_eq!(
        link_types(&resolver, "knime://knime.workflow/../other/x.csv"),
        expected(&[
            (
                UrlCategory::MountpointAbsolute,
                "knime://My-Hub/Users/john/Private/folder/other/x.csv"
            ),
            (
                UrlCategory::MountpointRelative,
                "knime://knime.mountpoint/folder/other/x.csv"
            ),
            (
                UrlCategory::HubSpaceRelative,
                "knime://knime.space/folder/other/x.csv"
            ),
            (
                UrlCategory::WorkflowRelative,
                "knime://knime.workflow/../other/x.csv"
            ),
        ])
    );
}

#[test]
fn node_relative_link_types() {
    let resolver = resolver(&local_context());
    let node = NodeContext::saved(local_workflow_dir(), local_workflow_dir().join("Node (#1)"));
    let forms = resolver
        .change_link_type("knime://knime.node/model.bin", Some(&node))
        .unwrap();
    assert_eq!(
        forms.keys().copied().collect::<Vec<_>>(),
        vec![UrlCategory::NodeRelative]
    );
    assert_eq!(
        resolver
            .resolve("knime://knime.node/model.bin", Some(&node))
            .unwrap()
            .to_file_path()
            .unwrap(),
        local_workflow_dir().join("Node (#1)").join("model.bin")
    );
}

#[test]
fn temp_copy_from_mountpoint_stays_symbolic() {
    let resolver = resolver(&temp_copy_hub_context(true));
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/../test.txt", None)
            .unwrap()
            .as_str(),
        "knime://LOCAL/Users/john/Private/folder/test.txt"
    );
    assert_eq!(
        resolver
            .resolve("knime://My-Hub/Users/john/Private/x.txt", None)
            .unwrap()
            .as_str(),
        "knime://LOCAL/Users/john/Private/x.txt"
    );
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/data/x.txt", None)
            .unwrap()
            .to_file_path()
            .unwrap(),
        job_dir().join("data").join("x.txt")
    );
    assert_eq!(
        resolver
            .resolve_to_absolute("knime://knime.space/x.txt", None)
            .unwrap()
            .map(|url| url.to_string())
            .as_deref(),
        Some("knime://LOCAL/Users/john/Private/x.txt")
    );
}

#[test]
fn temp_copy_without_mountpoint_uses_repository() {
    let resolver = resolver(&temp_copy_hub_context(false));
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/../test.txt", None)
            .unwrap()
            .as_str(),
        format!("{HUB_REPOSITORY}/Users/john/Private/folder/test.txt:data")
    );
    assert_eq!(
        resolver
            .resolve("knime://Elsewhere/some/file.txt", None)
            .unwrap()
            .as_str(),
        "knime://Elsewhere/some/file.txt"
    );
}

#[test]
fn temp_copy_of_server_workflow() {
    let resolver = resolver(&temp_copy_server_context());
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/../x.txt", None)
            .unwrap()
            .as_str(),
        format!("{SERVER_REPOSITORY}/group/x.txt:data")
    );
    let err = resolver
        .resolve("knime://knime.mountpoint/x.txt?version=1", None)
        .unwrap_err();
    assert!(err.to_string().contains("on KNIME Server"));
}

#[test]
fn remote_editors_defer_to_mount_table() {
    let hub = resolver(&remote_hub_editor_context());
    assert_eq!(
        hub.resolve("knime://knime.space/a.txt?version=4", None)
            .unwrap()
            .as_str(),
        "knime://My-Hub/Users/john/Private/a.txt?version=4"
    );
    let err = hub
        .resolve("knime://knime.node/a.txt", Some(&NodeContext::unsaved()))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NodeRelativeNotSupported { .. }));

    let server = resolver(&remote_server_editor_context());
    assert_eq!(
        server
            .resolve("knime://knime.workflow/../../x.txt", None)
            .unwrap()
            .as_str(),
        "knime://My-Server/x.txt"
    );
    let err = server
        .resolve("knime://knime.workflow/../../../x.txt", None)
        .unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::ScopeViolation {
            scope: Scope::MountPoint,
            ..
        }
    ));
}

#[test]
fn contextless_resolution() {
    let resolver = contextless_resolver();
    assert_eq!(
        resolver
            .resolve("knime://Foo/x.txt?version=4", None)
            .unwrap()
            .as_str(),
        "knime://Foo/x.txt?version=4"
    );
    for url in [
        "knime://knime.workflow/x.txt",
        "knime://knime.mountpoint/x.txt",
        "knime://knime.space/x.txt",
    ] {
        let err = resolver.resolve(url, None).unwrap_err();
        assert!(err.to_string().contains("without a workflow context"), "{err}");
    }
    assert_eq!(
        link_types(&resolver, "knime://Foo/x.txt"),
        expected(&[(UrlCategory::MountpointAbsolute, "knime://Foo/x.txt")])
    );
}

#[test]
fn foreign_mounts_can_be_rejected() {
    let config = ResolverConfig::new().with_external_mounts(ExternalMounts::Reject);
    let resolver = KnimeUrlResolver::for_context(Some(&hub_executor_context()), &config).unwrap();
    let err = resolver.resolve("knime://Other/x.txt", None).unwrap_err();
    assert!(matches!(err, ResolutionError::UnknownMountId { ref mount_id, .. } if mount_id == "Other"));
}

#[test]
fn knwf_workflow_without_mountpoint() {
    let resolver = resolver(&knwf_context());
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/data/x.csv", None)
            .unwrap()
            .to_file_path()
            .unwrap(),
        local_workflow_dir().join("data").join("x.csv")
    );
    let err = resolver
        .resolve("knime://knime.space/x.csv", None)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoMountpoint { .. }));
}

#[test]
fn context_from_json() {
    let json = r#"{
        "type": "virtual-node",
        "delegate": {
            "type": "server-executor",
            "executor": { "local-workflow-path": "/tmp/job/workflow" },
            "location": {
                "repository-address": "http://localhost:8080/knime",
                "default-mount-id": "Server",
                "workflow-path": "/group/workflow"
            }
        },
        "restrictions": ["workflow-data-area-access"]
    }"#;
    let context: ExecutionContext = serde_json::from_str(json).unwrap();
    let resolver = resolver(&context);
    assert_eq!(resolver.name(), "virtual-node");
    assert_eq!(
        resolver
            .resolve("knime://knime.workflow/../x.txt", None)
            .unwrap()
            .as_str(),
        "http://localhost:8080/knime/group/x.txt:data"
    );
}
