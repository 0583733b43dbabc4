// Storage node: coordinator-replication protocol and hinted handoff.
//
// One `StorageNode` per server process. All mutable state — local store,
// hinted-replica store, liveness flag, routing table — lives behind a
// single `parking_lot::Mutex`. The coordinator path never re-enters its own
// lock (it mutates the maps directly rather than looping back through
// `put`), so a plain, non-reentrant mutex is enough.

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::NodeConfig;
use crate::error::{Result, StorageNodeError};
use crate::logging::{OperationResult, OperationType, StorageNodeLogger};
use crate::persistence::{load_backup, PersistenceHandle};
use crate::transport::{NodeClient, PutRequest};
use crate::types::{GetOutcome, NodeAddress, PreferenceList, PutOutcome, RoutingTable};

struct Inner {
    local_store: HashMap<String, String>,
    /// key -> (value, intended target this node is holding the value for).
    hinted_replica: HashMap<String, (String, NodeAddress)>,
    active: bool,
    routing_table: RoutingTable,
    me: Option<NodeAddress>,
}

pub struct StorageNode {
    inner: Mutex<Inner>,
    config: NodeConfig,
    node_client: Arc<dyn NodeClient>,
    persistence: PersistenceHandle,
    logger: StorageNodeLogger,
}

impl StorageNode {
    pub fn new(config: NodeConfig, node_client: Arc<dyn NodeClient>) -> Arc<Self> {
        let backup_path = std::path::PathBuf::from(&config.backup_path);
        let local_store = load_backup(&backup_path);
        let persistence = PersistenceHandle::spawn(backup_path);
        let logger = StorageNodeLogger::new(format!("{}:{}", config.host, config.port));

        Arc::new(Self {
            inner: Mutex::new(Inner {
                local_store,
                hinted_replica: HashMap::new(),
                active: true,
                routing_table: Vec::new(),
                me: None,
            }),
            config,
            node_client,
            persistence,
            logger,
        })
    }

    /// Install the routing table pushed by the router and learn this node's
    /// own canonical address from `table[0][0]`.
    pub fn set_routing_table(&self, table: RoutingTable) {
        let mut inner = self.inner.lock();
        inner.me = table.first().and_then(|list| list.first().cloned());
        inner.routing_table = table;
    }

    pub fn ping(&self) -> bool {
        self.inner.lock().active
    }

    pub fn toggle_active(&self) {
        let mut inner = self.inner.lock();
        inner.active = !inner.active;
    }

    /// `put` as exposed to a coordinator: direct write, or a hint if
    /// `hint_target` is supplied.
    pub fn put(&self, key: &str, value: &str, hint_target: Option<NodeAddress>) -> Result<PutOutcome> {
        let mut inner = self.inner.lock();
        if !inner.active {
            return Err(StorageNodeError::Inactive);
        }

        if let Some(target) = hint_target {
            inner
                .hinted_replica
                .insert(key.to_string(), (value.to_string(), target));
            return Ok(PutOutcome::Created);
        }

        let existed = inner.local_store.contains_key(key);
        inner.local_store.insert(key.to_string(), value.to_string());
        self.persistence.persist(inner.local_store.clone());
        Ok(PutOutcome::from_existed(existed))
    }

    pub fn fetch(&self, key: &str, is_primary: bool) -> Option<String> {
        let inner = self.inner.lock();
        if is_primary {
            inner.local_store.get(key).cloned()
        } else {
            inner.hinted_replica.get(key).map(|(v, _)| v.clone())
        }
    }

    /// Remove a key from this node's local store only. Deletion is not
    /// replicated across the preference list (spec non-goal), so callers
    /// that want a key gone cluster-wide must delete at every replica
    /// themselves. Returns whether the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let existed = inner.local_store.remove(key).is_some();
        if existed {
            self.persistence.persist(inner.local_store.clone());
        }
        existed
    }

    /// Keys currently held in this node's local store, for diagnostics.
    pub fn list_keys(&self) -> Vec<String> {
        self.inner.lock().local_store.keys().cloned().collect()
    }

    /// Coordinator write protocol: sloppy-quorum replication with hinting.
    pub async fn coordinator_put(
        &self,
        key: &str,
        value: &str,
        preference_list: &PreferenceList,
    ) -> Result<PutOutcome> {
        let started = Instant::now();
        let (me, n, w) = {
            let inner = self.inner.lock();
            let me = inner
                .me
                .clone()
                .ok_or(StorageNodeError::RouterUninitialized)?;
            (me, self.config.n, self.config.w)
        };

        let i0 = preference_list
            .iter()
            .position(|a| a == &me)
            .ok_or(StorageNodeError::NotInPreferenceList)?;

        let existed = self.inner.lock().local_store.contains_key(key);

        // Everything before i0 was skipped by the router because it failed
        // a liveness probe; that is the initial failed-head queue.
        let mut failed_head: Vec<NodeAddress> = preference_list[..i0].to_vec();

        // Probe the remainder of the list, preserving (position, address) order.
        let candidates = &preference_list[i0 + 1..];
        let probes: FuturesUnordered<_> = candidates
            .iter()
            .enumerate()
            .map(|(offset, addr)| {
                let idx = i0 + 1 + offset;
                let addr = addr.clone();
                let client = Arc::clone(&self.node_client);
                async move {
                    let live = client.ping(&addr).await;
                    (idx, addr, live)
                }
            })
            .collect();
        let probed: Vec<(usize, NodeAddress, bool)> = probes.collect().await;
        let mut up: Vec<(usize, NodeAddress)> = probed
            .iter()
            .filter(|(_, _, live)| *live)
            .map(|(idx, addr, _)| (*idx, addr.clone()))
            .collect();
        up.sort_by_key(|(idx, _)| *idx);

        // Down intended replicas discovered by the probe join the queue
        // behind whatever the router already skipped, in position order, so
        // substitutes hint for them instead of receiving a direct write.
        let mut down_intended: Vec<(usize, NodeAddress)> = probed
            .iter()
            .filter(|(idx, _, live)| !*live && *idx < n)
            .map(|(idx, addr, _)| (*idx, addr.clone()))
            .collect();
        down_intended.sort_by_key(|(idx, _)| *idx);
        failed_head.extend(down_intended.into_iter().map(|(_, addr)| addr));

        if up.len() + 1 < w {
            self.logger.log(
                OperationType::CoordinatorPut,
                OperationResult::QuorumFailure,
                Some(key),
                Some(&format!("{} of {} required writers reachable", up.len() + 1, w)),
                Some(started.elapsed().as_millis() as u64),
            );
            return Err(StorageNodeError::QuorumFailure(format!(
                "only {} of {} required writers reachable",
                up.len() + 1,
                w
            )));
        }

        // Write locally: as an intended replica if i0 < N, otherwise as a
        // hint for the head of the failed-head queue.
        if i0 < n {
            let mut inner = self.inner.lock();
            inner.local_store.insert(key.to_string(), value.to_string());
            self.persistence.persist(inner.local_store.clone());
        } else if let Some(hint_target) = failed_head.first().cloned() {
            let mut inner = self.inner.lock();
            inner
                .hinted_replica
                .insert(key.to_string(), (value.to_string(), hint_target));
        }

        let mut success = 1usize;
        let mut active_count = 1usize;
        let mut tasks = FuturesUnordered::new();
        for (idx, addr) in up {
            let req = if idx < n {
                PutRequest {
                    key: key.to_string(),
                    value: value.to_string(),
                    hint_target: None,
                }
            } else if active_count < n {
                let hint_target = failed_head.first().cloned();
                if !failed_head.is_empty() {
                    failed_head.remove(0);
                }
                PutRequest {
                    key: key.to_string(),
                    value: value.to_string(),
                    hint_target,
                }
            } else {
                active_count += 1;
                continue;
            };
            active_count += 1;

            let client = Arc::clone(&self.node_client);
            tasks.push(tokio::spawn(
                async move { client.put(&addr, req).await },
            ));
        }

        // Fan out concurrently; return as soon as W acknowledgements are in,
        // letting stragglers keep running detached (they are already
        // `tokio::spawn`ed, so dropping the stream does not cancel them).
        while success < w {
            match tasks.next().await {
                Some(Ok(Ok(_))) => success += 1,
                Some(Ok(Err(e))) => warn!("replica write failed: {e}"),
                Some(Err(e)) => warn!("replica write task panicked: {e}"),
                None => break,
            }
        }

        self.logger.log(
            OperationType::CoordinatorPut,
            OperationResult::Success,
            Some(key),
            None,
            Some(started.elapsed().as_millis() as u64),
        );
        Ok(PutOutcome::from_existed(existed))
    }

    /// Coordinator read protocol: fan out, tally, return on read quorum.
    pub async fn get(&self, key: &str, preference_list: &PreferenceList) -> Result<GetOutcome> {
        let (me, n, r) = {
            let inner = self.inner.lock();
            let me = inner
                .me
                .clone()
                .ok_or(StorageNodeError::RouterUninitialized)?;
            (me, self.config.n, self.config.r)
        };

        let i0 = preference_list
            .iter()
            .position(|a| a == &me)
            .ok_or(StorageNodeError::NotInPreferenceList)?;

        let mut outputs: Vec<Option<String>> = vec![self.inner.lock().local_store.get(key).cloned()];

        for idx in (i0 + 1)..preference_list.len() {
            if outputs.len() >= n {
                break;
            }
            let addr = &preference_list[idx];
            if !self.node_client.ping(addr).await {
                continue;
            }
            match self.node_client.fetch(addr, key, idx < n).await {
                Ok(value) => outputs.push(value),
                Err(e) => warn!("fetch from {addr} failed: {e}"),
            }
        }

        let outcome = tally(&outputs, r);
        self.logger.log(
            OperationType::CoordinatorGet,
            match outcome {
                GetOutcome::Found(_) => OperationResult::Success,
                GetOutcome::NotFound => OperationResult::NotFound,
                GetOutcome::QuorumFailure => OperationResult::QuorumFailure,
            },
            Some(key),
            None,
            None,
        );
        Ok(outcome)
    }

    /// Hinted-handoff background worker. Intended to be
    /// `tokio::spawn`ed once at node startup; never returns.
    pub async fn run_handoff_worker(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.handoff_interval_secs));
        loop {
            interval.tick().await;
            self.run_handoff_cycle().await;
        }
    }

    /// Run a single handoff cycle immediately, without waiting for the
    /// next tick of `run_handoff_worker`'s interval. Exposed so tests can
    /// deterministically drive recovery in tests instead of
    /// sleeping past the real 10s interval.
    pub async fn run_handoff_cycle(&self) {
        let targets: HashSet<NodeAddress> = {
            let inner = self.inner.lock();
            inner
                .hinted_replica
                .values()
                .map(|(_, target)| target.clone())
                .collect()
        };

        for target in targets {
            if !self.node_client.ping(&target).await {
                continue;
            }

            let pending: Vec<(String, String)> = {
                let inner = self.inner.lock();
                inner
                    .hinted_replica
                    .iter()
                    .filter(|(_, (_, t))| t == &target)
                    .map(|(k, (v, _))| (k.clone(), v.clone()))
                    .collect()
            };

            let mut delivered = Vec::new();
            for (key, value) in pending {
                let req = PutRequest {
                    key: key.clone(),
                    value,
                    hint_target: None,
                };
                match self.node_client.put(&target, req).await {
                    Ok(_) => delivered.push(key),
                    Err(e) => warn!("handoff to {target} failed for a pending hint: {e}"),
                }
            }

            if !delivered.is_empty() {
                {
                    let mut inner = self.inner.lock();
                    for key in &delivered {
                        inner.hinted_replica.remove(key);
                    }
                }
                self.logger.log(
                    OperationType::HandoffCycle,
                    OperationResult::Success,
                    None,
                    Some(&format!("delivered {} hint(s) to {target}", delivered.len())),
                    None,
                );
            }
        }
    }
}

/// Majority tally over up to N observed values, `None` counted as a value
/// in its own right (a documented quirk: a stale `null`
/// can outvote a single real value).
fn tally(outputs: &[Option<String>], r: usize) -> GetOutcome {
    let mut counts: Vec<(Option<String>, usize)> = Vec::new();
    for value in outputs {
        if let Some(entry) = counts.iter_mut().find(|(v, _)| v == value) {
            entry.1 += 1;
        } else {
            counts.push((value.clone(), 1));
        }
    }

    let winner = counts
        .iter()
        .fold(None::<&(Option<String>, usize)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        });

    match winner {
        None => GetOutcome::NotFound,
        Some((None, _)) => GetOutcome::NotFound,
        Some((Some(value), count)) if *count >= r => GetOutcome::Found(value.clone()),
        Some(_) => GetOutcome::QuorumFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_picks_highest_count() {
        let outputs = vec![Some("a".to_string()), Some("a".to_string()), Some("b".to_string())];
        assert_eq!(tally(&outputs, 2), GetOutcome::Found("a".to_string()));
    }

    #[test]
    fn tally_below_read_quorum_is_failure() {
        let outputs = vec![Some("a".to_string()), Some("b".to_string())];
        assert_eq!(tally(&outputs, 2), GetOutcome::QuorumFailure);
    }

    #[test]
    fn tally_null_majority_is_not_found() {
        // Documented quirk: a stale null can outvote a real value.
        let outputs = vec![None, None, Some("a".to_string())];
        assert_eq!(tally(&outputs, 2), GetOutcome::NotFound);
    }

    struct UnusedNodeClient;

    #[async_trait::async_trait]
    impl crate::transport::NodeClient for UnusedNodeClient {
        async fn ping(&self, _addr: &NodeAddress) -> bool {
            unreachable!()
        }
        async fn toggle_active(&self, _addr: &NodeAddress) -> Result<()> {
            unreachable!()
        }
        async fn set_routing_table(&self, _addr: &NodeAddress, _table: &RoutingTable) -> Result<()> {
            unreachable!()
        }
        async fn put(&self, _addr: &NodeAddress, _req: crate::transport::PutRequest) -> Result<PutOutcome> {
            unreachable!()
        }
        async fn fetch(&self, _addr: &NodeAddress, _key: &str, _is_primary: bool) -> Result<Option<String>> {
            unreachable!()
        }
        async fn coordinator_put(
            &self,
            _addr: &NodeAddress,
            _key: &str,
            _value: &str,
            _preference_list: &[NodeAddress],
        ) -> Result<PutOutcome> {
            unreachable!()
        }
        async fn get(
            &self,
            _addr: &NodeAddress,
            _key: &str,
            _preference_list: &[NodeAddress],
        ) -> Result<(Option<String>, i32)> {
            unreachable!()
        }
    }

    fn test_node() -> Arc<StorageNode> {
        let config = NodeConfig {
            host: "127.0.0.1".to_string(),
            port: 9999,
            n: 3,
            w: 2,
            r: 2,
            backup_path: std::env::temp_dir()
                .join(format!("storage_node_unit_test_{}.json", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            handoff_interval_secs: 10,
        };
        StorageNode::new(config, Arc::new(UnusedNodeClient))
    }

    #[tokio::test]
    async fn delete_removes_key_and_reports_prior_existence() {
        let node = test_node();
        assert!(!node.delete("k"));
        node.put("k", "v", None).unwrap();
        assert!(node.delete("k"));
        assert_eq!(node.fetch("k", true), None);
        assert!(!node.delete("k"));
    }

    #[tokio::test]
    async fn list_keys_reflects_local_store_contents() {
        let node = test_node();
        node.put("a", "1", None).unwrap();
        node.put("b", "2", None).unwrap();
        let mut keys = node.list_keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        node.delete("a");
        assert_eq!(node.list_keys(), vec!["b".to_string()]);
    }
}
