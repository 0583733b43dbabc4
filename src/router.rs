// Router service: builds the ring at `init`, resolves coordinators for
// client requests, forwards with liveness-aware retry.
//
// Stateless beyond the ring and per-node routing-table cache built at
// `init`, reached through the `NodeClient` transport seam (see
// `transport.rs`).

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;

use crate::config::{AddressTranslator, RouterConfig};
use crate::error::Result;
use crate::logging::{OperationResult, OperationType, StorageNodeLogger};
use crate::ring::Ring;
use crate::transport::NodeClient;
use crate::types::{NodeAddress, PreferenceList, RoutingTable};

struct State {
    ring: Ring,
    /// Per-node routing table, cached so `get`/`put` never need to recompute
    /// a preference list — only look up the coordinator vnode's table.
    tables: HashMap<NodeAddress, RoutingTable>,
    servers: Vec<NodeAddress>,
}

pub struct RouterService {
    state: RwLock<Option<State>>,
    config: RouterConfig,
    translator: AddressTranslator,
    node_client: Arc<dyn NodeClient>,
    logger: StorageNodeLogger,
}

impl RouterService {
    pub fn new(config: RouterConfig, node_client: Arc<dyn NodeClient>) -> Self {
        let translator = AddressTranslator::new(config.address_map.clone());
        let logger = StorageNodeLogger::new(format!("{}:{}", config.lb_host, config.lb_port));
        Self {
            state: RwLock::new(None),
            config,
            translator,
            node_client,
            logger,
        }
    }

    /// Build the ring from `server_list`, compute routing tables, and push
    /// each to its node. Returns 0 on success, −1 on any node rejecting the
    /// pushed table.
    pub async fn init(&self, server_list: &[String]) -> i32 {
        let servers: Result<Vec<NodeAddress>> = server_list.iter().map(|s| s.parse()).collect();
        let servers = match servers {
            Ok(s) => s,
            Err(e) => {
                self.logger.log(
                    OperationType::RouterInit,
                    OperationResult::NetworkError,
                    None,
                    Some(&e.to_string()),
                    None,
                );
                return -1;
            }
        };

        let ring = Ring::build(&servers, self.config.vnodes);
        let built = ring.build_all_routing_tables(&servers, self.config.vnodes);

        let mut tables = HashMap::new();
        for (node, table) in &built {
            let translated_node = self.translator.translate(node);
            let translated_table: RoutingTable = table
                .iter()
                .map(|list| self.translator.translate_list(list))
                .collect();

            if let Err(e) = self
                .node_client
                .set_routing_table(&translated_node, &translated_table)
                .await
            {
                self.logger.log(
                    OperationType::RoutingTablePush,
                    OperationResult::NetworkError,
                    None,
                    Some(&format!("{translated_node}: {e}")),
                    None,
                );
                return -1;
            }
            tables.insert(node.clone(), translated_table);
        }

        let server_count = servers.len();
        *self.state.write() = Some(State {
            ring,
            tables,
            servers,
        });
        self.logger.log(
            OperationType::RouterInit,
            OperationResult::Success,
            None,
            Some(&format!("{server_count} servers")),
            None,
        );
        0
    }

    /// Clear the ring, routing tables, and server list. Returns 0 always —
    /// there is nothing that can fail locally.
    pub fn destroy(&self) -> i32 {
        *self.state.write() = None;
        self.logger
            .log(OperationType::RouterDestroy, OperationResult::Success, None, None, None);
        0
    }

    /// Walk the first N entries of the coordinator vnode's preference list;
    /// the first to answer a liveness probe becomes the coordinator for
    /// this request. Returns `None` if no node responds.
    async fn select_coordinator(&self, key: &str) -> Option<(NodeAddress, PreferenceList)> {
        let table = {
            let guard = self.state.read();
            let state = guard.as_ref()?;
            let vnode = state.ring.coordinator_vnode(key)?;
            tracing::trace!(key, ring_point = %crate::ring::hash128_hex(key), coordinator = %vnode.node, "resolved coordinator vnode");
            state.tables.get(&vnode.node)?.clone()
        };
        let pref = table.first()?.clone();
        let n = self.config.n.min(pref.len());

        for addr in pref.iter().take(n) {
            if self.node_client.ping(addr).await {
                return Some((addr.clone(), pref));
            }
        }
        None
    }

    pub async fn get(&self, key: &str) -> (Option<String>, i32) {
        if self.state.read().is_none() {
            return (None, -1);
        }
        let Some((coordinator, pref)) = self.select_coordinator(key).await else {
            return (None, -1);
        };
        match self.node_client.get(&coordinator, key, &pref).await {
            Ok((value, status)) => (value, status),
            Err(_) => (None, -1),
        }
    }

    pub async fn put(&self, key: &str, value: &str) -> i32 {
        if self.state.read().is_none() {
            return -1;
        }
        let Some((coordinator, pref)) = self.select_coordinator(key).await else {
            return -1;
        };
        match self
            .node_client
            .coordinator_put(&coordinator, key, value, &pref)
            .await
        {
            Ok(outcome) => outcome.status_code(),
            Err(_) => -1,
        }
    }

    /// Test hook: flip a node's liveness flag directly.
    pub async fn toggle_server(&self, host: &str, port: u16) -> Result<()> {
        let addr = NodeAddress::new(host, port);
        self.node_client.toggle_active(&addr).await
    }
}
