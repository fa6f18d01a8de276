//! Policy resolution through the full loader, cache and engine stack.

mod common;

use common::{login, policy, request, target, Harness, NAMESPACE, TEAM_GROUP};
use vaultsync::domain::{GroupId, SecretKeyReference};
use vaultsync::observability::VaultCall;
use vaultsync::SyncStatus;

/// Register a client that can read the team group and declare its policy
async fn add_client(harness: &Harness, client_id: &str, declarations: &str) {
    harness.vault.register_client(client_id, "pw").await;
    harness.vault.grant(client_id, &GroupId::new(TEAM_GROUP)).await;
    harness
        .put_policy(policy(&format!("policy-{}", client_id), client_id, "pw", declarations))
        .await;
}

async fn resolved_client(harness: &Harness) -> String {
    let client = harness.synchronizer.engine().get_client(&request("db")).await.unwrap();
    client.client_id().to_string()
}

#[tokio::test]
async fn test_narrowest_selector_wins() {
    let harness = Harness::empty().await;
    harness.namespaces.upsert("team-a-staging", [("team", "a"), ("env", "staging")]).await;
    add_client(&harness, "broad", "  - type: namespace\n    labelSelector: team=a\n").await;
    add_client(&harness, "narrow", "  - type: namespace\n    labelSelector: team=a,env=prod\n")
        .await;

    assert_eq!(resolved_client(&harness).await, "narrow");
}

#[tokio::test]
async fn test_exact_name_beats_pattern_and_selector() {
    let harness = Harness::empty().await;
    add_client(&harness, "selector", "  - type: namespace\n    labelSelector: team=a\n").await;
    add_client(&harness, "pattern", "  - type: namespace\n    nameRegex: ^team-\n").await;
    add_client(&harness, "exact", "  - type: namespace\n    name: team-a\n").await;

    assert_eq!(resolved_client(&harness).await, "exact");
}

#[tokio::test]
async fn test_pattern_beats_selector() {
    let harness = Harness::empty().await;
    add_client(&harness, "selector", "  - type: namespace\n    labelSelector: env=prod\n").await;
    add_client(&harness, "pattern", "  - type: namespace\n    nameRegex: ^team-\n").await;

    assert_eq!(resolved_client(&harness).await, "pattern");
}

#[tokio::test]
async fn test_tie_is_a_conflict_until_resolved() {
    let harness = Harness::empty().await;
    harness.put(login("r1", "svc", "pw1")).await;
    add_client(&harness, "first", "  - type: namespace\n    labelSelector: team=a\n").await;
    add_client(&harness, "second", "  - type: namespace\n    labelSelector: env=prod\n").await;

    let mut request = request("db").with_reference(SecretKeyReference::new("pass", "r1"));
    let mut target = target("db");
    let outcome = harness.reconcile(&mut request, &mut target).await;

    assert_eq!(outcome.status, SyncStatus::OutOfSync);
    let message = outcome.event.unwrap().message;
    assert!(message.contains("client 'second'"));
    assert!(message.contains("client 'first'"));
    assert!(message.contains(&format!("namespace '{}'", NAMESPACE)));

    // The conflict dropped the cached policies, so a new exact policy is
    // picked up on the next pass.
    add_client(&harness, "exact", "  - type: namespace\n    name: team-a\n").await;
    let outcome = harness.reconcile(&mut request, &mut target).await;

    assert_eq!(outcome.status, SyncStatus::Synced);
    assert_eq!(target.get_str("pass"), Some("pw1"));
}

#[tokio::test]
async fn test_missing_policy() {
    let harness = Harness::empty().await;

    let mut request = request("db").with_reference(SecretKeyReference::new("pass", "r1"));
    let outcome = harness.reconcile(&mut request, &mut target("db")).await;

    assert_eq!(outcome.status, SyncStatus::OutOfSync);
    assert_eq!(outcome.event.unwrap().message, "No credentials found for namespace team-a");
}

#[tokio::test]
async fn test_restricted_records_carry_no_policies() {
    let harness = Harness::empty().await;
    let mut restricted =
        policy("policy-red", "red", "pw", "  - type: namespace\n    name: team-a\n");
    restricted.color = Some("RED".to_string());
    harness.put_policy(restricted).await;

    let err = harness.synchronizer.engine().get_client(&request("db")).await.unwrap_err();
    assert_eq!(err.kind(), "PolicyResolutionError");
    assert_eq!(harness.metrics.count(VaultCall::GetRecord), 0);
}

#[tokio::test]
async fn test_clients_are_shared_across_requests() {
    let harness = Harness::new().await;
    harness.put(login("r1", "svc", "pw1")).await;

    for name in ["one", "two", "three"] {
        let mut request = request(name).with_reference(SecretKeyReference::new("pass", "r1"));
        let outcome = harness.reconcile(&mut request, &mut target(name)).await;
        assert_eq!(outcome.status, SyncStatus::Synced);
    }

    // Operator plus team client, each probed once
    assert_eq!(harness.metrics.count(VaultCall::Version), 2);
    assert_eq!(harness.metrics.count(VaultCall::ListGroups), 2);
    assert_eq!(harness.synchronizer.engine().clients().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_passes_share_one_connection() {
    let harness = Harness::new().await;
    harness.put(login("r1", "svc", "pw1")).await;

    let passes = (0..8).map(|i| {
        let harness = &harness;
        async move {
            let name = format!("db-{}", i);
            let mut request =
                request(&name).with_reference(SecretKeyReference::new("pass", "r1"));
            let mut target = target(&name);
            harness.reconcile(&mut request, &mut target).await.status
        }
    });
    let statuses = futures::future::join_all(passes).await;

    assert!(statuses.iter().all(|status| *status == SyncStatus::Synced));
    assert_eq!(harness.metrics.count(VaultCall::Version), 2);
    assert_eq!(harness.metrics.count(VaultCall::ListRecords), 2);
}
