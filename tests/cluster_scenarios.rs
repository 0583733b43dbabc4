// End-to-end scenarios from spec §8, driven against an in-process
// `SimulatedCluster` of five nodes (A-E) behind a `RouterService`.

mod common;

use common::build_five_node_cluster;
use dynamo_kv_store::ring::Ring;
use dynamo_kv_store::transport::NodeClient;

#[tokio::test]
async fn basic_put_then_get_round_trips() {
    let tc = build_five_node_cluster().await;
    let status = tc.router.put("tirth", "System").await;
    assert!(status == 0 || status == 1);

    let (value, status) = tc.router.get("tirth").await;
    assert_eq!(value, Some("System".to_string()));
    assert_eq!(status, 0);
}

#[tokio::test]
async fn missing_key_is_not_found() {
    let tc = build_five_node_cluster().await;
    let (value, status) = tc.router.get("non_existent_key").await;
    assert_eq!(value, None);
    assert_eq!(status, 1);
}

#[tokio::test]
async fn duplicate_put_reports_update() {
    let tc = build_five_node_cluster().await;
    let first = tc.router.put("k", "v").await;
    assert!(first == 0 || first == 1);
    let second = tc.router.put("k", "v").await;
    assert_eq!(second, 0);
}

#[tokio::test]
async fn two_replica_failure_then_recovery_via_hinted_handoff() {
    let tc = build_five_node_cluster().await;

    let (_, status) = tc.router.get("123").await;
    assert_eq!(status, 1); // nothing written yet

    // Recompute the same ring the cluster was built with to find "123"'s
    // preference list, then take down its two non-coordinator intended
    // replicas (positions 1 and 2) exactly as spec §8 scenario 4 does with
    // D live, A and C down.
    let ring = Ring::build(&tc.addrs, 8);
    let pref = ring.preference_list_for_key("123");
    let down_a = pref[1].clone();
    let down_b = pref[2].clone();
    tc.cluster.toggle_active(&down_a).await.unwrap();
    tc.cluster.toggle_active(&down_b).await.unwrap();

    let put_status = tc.router.put("123", "luffy").await;
    assert!(put_status == 0 || put_status == 1, "write must stay available under N=3,W=2 with only 2 of 5 down");

    let (value, status) = tc.router.get("123").await;
    assert_eq!(value, Some("luffy".to_string()));
    assert_eq!(status, 0);

    // Recovery: toggle the two nodes back up and run a handoff cycle.
    tc.cluster.toggle_active(&down_a).await.unwrap();
    tc.cluster.toggle_active(&down_b).await.unwrap();

    for addr in &tc.addrs {
        if let Some(node) = tc.cluster_node(addr) {
            node.run_handoff_cycle().await;
        }
    }

    let (value, status) = tc.router.get("123").await;
    assert_eq!(value, Some("luffy".to_string()));
    assert_eq!(status, 0);
}

#[tokio::test]
async fn quorum_impossible_write_fails() {
    let tc = build_five_node_cluster().await;
    // Four of five nodes down leaves at most one live node in the whole
    // cluster, so no preference list can muster W=2 reachable writers
    // regardless of ring layout.
    for addr in tc.addrs.iter().take(4) {
        tc.cluster.toggle_active(addr).await.unwrap();
    }
    let status = tc.router.put("k", "v").await;
    assert_eq!(status, -1);
}

#[tokio::test]
async fn read_quorum_overlap_observes_written_value() {
    let tc = build_five_node_cluster().await;
    let status = tc.router.put("k", "v").await;
    assert!(status == 0 || status == 1);
    let (value, status) = tc.router.get("k").await;
    assert_eq!(value, Some("v".to_string()));
    assert_eq!(status, 0);
}
