// Distributed key-value store: consistent hashing with virtual nodes,
// quorum replication (N/W/R), and hinted handoff behind a router tier.
//
// # Architecture
//
// Three components, matching the dependency order they're built in below:
//
// * **Ring & routing** (`ring`) — maps keys to a preference list of nodes
//   and builds the per-node routing tables pushed out at `init`.
// * **Storage node** (`storage_node`) — owns a local KV map and a
//   hinted-replica map; executes the coordinator-write and coordinator-read
//   protocols; runs the background handoff worker.
// * **Router** (`router`) — accepts client RPCs, resolves the coordinator
//   for a key, and forwards with liveness-aware retry.
//
// `transport` is the seam between coordination logic and the wire: real
// deployments use `HttpNodeClient`, tests use an in-process implementation
// so quorum and handoff behavior can be verified without sockets.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod ring;
pub mod router;
pub mod storage_node;
pub mod transport;
pub mod types;

pub use error::{Result, StorageNodeError};
pub use types::{GetOutcome, NodeAddress, PreferenceList, PutOutcome, RoutingTable, VNodeId};
