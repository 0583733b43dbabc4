// Consistent-hash ring and routing-table construction.
//
// The ring maps `H("{host}_{port}_{vnode_index}") -> VNodeId` for every
// vnode of every physical node, sorted by hash so that the coordinator for
// a key is a single successor lookup. Routing tables are precomputed once
// per vnode so that once a node knows its own table, it never has to ask
// the router for a preference list again.

use md5::{Digest, Md5};
use std::collections::BTreeMap;

use crate::types::{NodeAddress, PreferenceList, RoutingTable, VNodeId};

/// `H(s) = int(MD5(utf8(s)))`, treated as a 128-bit unsigned integer.
pub fn hash128(s: &str) -> u128 {
    let digest = Md5::digest(s.as_bytes());
    u128::from_be_bytes(digest.into())
}

/// Hex rendering of the raw MD5 digest behind [`hash128`], for log lines
/// that want the conventional digest form rather than the integer value.
pub fn hash128_hex(s: &str) -> String {
    hex::encode(Md5::digest(s.as_bytes()))
}

/// Sorted mapping from ring point to the vnode that owns it.
///
/// Ring points are vanishingly unlikely to collide; on collision the later
/// insertion wins, which `BTreeMap::insert` already gives us deterministically
/// as long as vnodes are inserted in a fixed order (servers in list order,
/// then vnode index ascending, as `build` does below).
pub struct Ring {
    points: BTreeMap<u128, VNodeId>,
}

impl Ring {
    /// Build the ring from the initial server list and vnode count.
    pub fn build(servers: &[NodeAddress], vnodes_per_node: u32) -> Self {
        let mut points = BTreeMap::new();
        for server in servers {
            for idx in 0..vnodes_per_node {
                let vnode = VNodeId::new(server.clone(), idx);
                let point = hash128(&vnode.ring_label());
                points.insert(point, vnode);
            }
        }
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Binary-search (via `BTreeMap::range`) for the least point ≥ `H(key)`,
    /// wrapping to the first entry if none is found.
    pub fn coordinator_vnode(&self, key: &str) -> Option<&VNodeId> {
        let target = hash128(key);
        self.points
            .range(target..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, vnode)| vnode)
    }

    /// Preference list for a key: the deduplicated clockwise walk from the
    /// coordinator vnode's ring position.
    pub fn preference_list_for_key(&self, key: &str) -> PreferenceList {
        let target = hash128(key);
        self.preference_list_from(target)
    }

    /// Deduplicated clockwise walk of every distinct physical node starting
    /// at (and including) the vnode whose ring point is the successor of
    /// `start_point`, wrapping around the ring once.
    fn preference_list_from(&self, start_point: u128) -> PreferenceList {
        let mut seen = std::collections::HashSet::new();
        let mut list = Vec::new();

        let head = self.points.range(start_point..);
        let wrap = self.points.range(..start_point);
        for (_, vnode) in head.chain(wrap) {
            if seen.insert(vnode.node.clone()) {
                list.push(vnode.node.clone());
            }
        }
        list
    }

    /// Build the per-vnode routing table for one physical node: for each of
    /// its vnodes, the clockwise walk starting at that vnode's own ring
    /// position (which therefore always begins with the node itself).
    pub fn routing_table_for(&self, node: &NodeAddress, vnodes_per_node: u32) -> RoutingTable {
        (0..vnodes_per_node)
            .map(|idx| {
                let vnode = VNodeId::new(node.clone(), idx);
                let point = hash128(&vnode.ring_label());
                self.preference_list_from(point)
            })
            .collect()
    }

    /// Build routing tables for every distinct physical node referenced on
    /// the ring, ready to be pushed via `set_routing_table`.
    pub fn build_all_routing_tables(
        &self,
        servers: &[NodeAddress],
        vnodes_per_node: u32,
    ) -> Vec<(NodeAddress, RoutingTable)> {
        servers
            .iter()
            .map(|node| (node.clone(), self.routing_table_for(node, vnodes_per_node)))
            .collect()
    }
}
