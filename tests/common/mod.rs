// In-process `NodeClient` implementation wired directly to sibling
// `StorageNode`s, used so the quorum/hinted-handoff scenarios in spec §8
// can be driven deterministically without real sockets — the test-side
// half of the `NodeClient` transport seam described in SPEC_FULL.md §7.

use async_trait::async_trait;
use dynamo_kv_store::config::NodeConfig;
use dynamo_kv_store::error::Result;
use dynamo_kv_store::router::RouterService;
use dynamo_kv_store::storage_node::StorageNode;
use dynamo_kv_store::transport::{NodeClient, PutRequest};
use dynamo_kv_store::types::{NodeAddress, PutOutcome, RoutingTable};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct SimulatedCluster {
    nodes: RwLock<HashMap<NodeAddress, Arc<StorageNode>>>,
}

impl SimulatedCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn node(&self, addr: &NodeAddress) -> Option<Arc<StorageNode>> {
        self.nodes.read().get(addr).cloned()
    }

    pub fn get_node(&self, addr: &NodeAddress) -> Option<Arc<StorageNode>> {
        self.node(addr)
    }
}

#[async_trait]
impl NodeClient for SimulatedCluster {
    async fn ping(&self, addr: &NodeAddress) -> bool {
        self.node(addr).map(|n| n.ping()).unwrap_or(false)
    }

    async fn toggle_active(&self, addr: &NodeAddress) -> Result<()> {
        if let Some(node) = self.node(addr) {
            node.toggle_active();
        }
        Ok(())
    }

    async fn set_routing_table(&self, addr: &NodeAddress, table: &RoutingTable) -> Result<()> {
        if let Some(node) = self.node(addr) {
            node.set_routing_table(table.clone());
        }
        Ok(())
    }

    async fn put(&self, addr: &NodeAddress, req: PutRequest) -> Result<PutOutcome> {
        let node = self.node(addr).expect("unknown node in simulated cluster");
        node.put(&req.key, &req.value, req.hint_target)
    }

    async fn fetch(&self, addr: &NodeAddress, key: &str, is_primary: bool) -> Result<Option<String>> {
        let node = self.node(addr).expect("unknown node in simulated cluster");
        Ok(node.fetch(key, is_primary))
    }

    async fn coordinator_put(
        &self,
        addr: &NodeAddress,
        key: &str,
        value: &str,
        preference_list: &[NodeAddress],
    ) -> Result<PutOutcome> {
        let node = self.node(addr).expect("unknown node in simulated cluster");
        node.coordinator_put(key, value, &preference_list.to_vec()).await
    }

    async fn get(
        &self,
        addr: &NodeAddress,
        key: &str,
        preference_list: &[NodeAddress],
    ) -> Result<(Option<String>, i32)> {
        let node = self.node(addr).expect("unknown node in simulated cluster");
        let outcome = node.get(key, &preference_list.to_vec()).await?;
        Ok(outcome.into_parts())
    }
}

/// Five named nodes A-E on `127.0.0.1:9001-9005`, wired into a shared
/// `SimulatedCluster` and a `RouterService` over it, matching spec §8's
/// canonical `N=3, W=2, R=2, V>=8` scenario setup.
pub struct TestCluster {
    pub cluster: Arc<SimulatedCluster>,
    pub router: RouterService,
    pub addrs: Vec<NodeAddress>,
}

impl TestCluster {
    pub fn cluster_node(&self, addr: &NodeAddress) -> Option<Arc<StorageNode>> {
        self.cluster.get_node(addr)
    }
}

pub async fn build_five_node_cluster() -> TestCluster {
    let cluster = SimulatedCluster::new();
    let addrs: Vec<NodeAddress> = (0..5)
        .map(|i| NodeAddress::new("127.0.0.1", 9001 + i as u16))
        .collect();

    // Unique backup path per test run so concurrently-running `#[tokio::test]`
    // functions (which all build a cluster on the same fixed addresses)
    // never share a file on disk.
    let run_id = uuid::Uuid::new_v4();

    for addr in &addrs {
        let node_config = NodeConfig {
            host: addr.host.clone(),
            port: addr.port,
            n: 3,
            w: 2,
            r: 2,
            backup_path: format!("/tmp/dynamo_kv_store_test_{run_id}_{}.json", addr.port),
            handoff_interval_secs: 10,
        };
        let node = StorageNode::new(node_config, cluster.clone());
        cluster.nodes.write().insert(addr.clone(), node);
    }

    let router_config = dynamo_kv_store::config::RouterConfig {
        lb_host: "127.0.0.1".to_string(),
        lb_port: 9000,
        vnodes: 8,
        hash_random: false,
        hash_seed: None,
        n: 3,
        address_map: HashMap::new(),
    };
    let router = RouterService::new(router_config, cluster.clone());
    let server_list: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
    assert_eq!(router.init(&server_list).await, 0);

    TestCluster {
        cluster,
        router,
        addrs,
    }
}
