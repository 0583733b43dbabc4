// Structured operation logging for storage nodes and the router.
//
// Mirrors the teacher's `StorageNodeLogger` shape (a tagged operation type,
// an outcome, and a tracing call at a level chosen by that outcome) scaled
// down to this crate's operation set: coordinator writes/reads, replica
// RPCs, handoff cycles, and routing-table pushes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OperationType {
    CoordinatorPut,
    CoordinatorGet,
    ReplicaPut,
    ReplicaFetch,
    HandoffCycle,
    LivenessProbe,
    RoutingTablePush,
    RouterInit,
    RouterDestroy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OperationResult {
    Success,
    NotFound,
    QuorumFailure,
    Inactive,
    NetworkError,
}

/// One logged operation. Kept small and `Serialize` so it can double as a
/// structured `tracing` field set or be dumped to JSON for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOperationLog {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub operation: OperationType,
    pub result: OperationResult,
    pub key: Option<String>,
    pub detail: Option<String>,
    pub duration_ms: Option<u64>,
}

pub struct StorageNodeLogger {
    node_id: String,
}

impl StorageNodeLogger {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }

    pub fn log(
        &self,
        operation: OperationType,
        result: OperationResult,
        key: Option<&str>,
        detail: Option<&str>,
        duration_ms: Option<u64>,
    ) -> NodeOperationLog {
        let entry = NodeOperationLog {
            timestamp: Utc::now(),
            node_id: self.node_id.clone(),
            operation,
            result,
            key: key.map(str::to_string),
            detail: detail.map(str::to_string),
            duration_ms,
        };

        match result {
            OperationResult::Success => info!(
                node = %self.node_id,
                ?operation,
                key = key.unwrap_or(""),
                duration_ms = duration_ms.unwrap_or(0),
                "operation completed"
            ),
            OperationResult::NotFound => debug!(
                node = %self.node_id,
                ?operation,
                key = key.unwrap_or(""),
                "key not found"
            ),
            OperationResult::QuorumFailure => warn!(
                node = %self.node_id,
                ?operation,
                key = key.unwrap_or(""),
                detail = detail.unwrap_or(""),
                "quorum not reached"
            ),
            OperationResult::Inactive => warn!(
                node = %self.node_id,
                ?operation,
                "node is inactive"
            ),
            OperationResult::NetworkError => error!(
                node = %self.node_id,
                ?operation,
                detail = detail.unwrap_or(""),
                "network error"
            ),
        }

        entry
    }
}

/// Initialize `tracing-subscriber` with `RUST_LOG`-driven filtering, the way
/// both teacher binaries do at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
