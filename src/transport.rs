// Transport seam between coordination logic and the wire.
//
// `NodeClient` is the abstraction the router and the storage-node
// coordinator path use to reach peers. `HttpNodeClient` is the real
// implementation (reqwest over the axum routes in `api::node_routes`); it
// is the only part of the crate that knows these are HTTP calls. Tests use
// an in-process implementation (`tests/support`) that calls sibling
// `StorageNode`s directly, the same seam the teacher's `StorageEngine`
// trait provides for swapping storage backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, StorageNodeError};
use crate::types::{NodeAddress, PreferenceList, PutOutcome, RoutingTable};

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
    /// Present when this is a hinted-handoff write on a substitute node.
    pub hint_target: Option<NodeAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutResponse {
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorPutRequest {
    pub key: String,
    pub value: String,
    pub preference_list: PreferenceList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: String,
    pub preference_list: PreferenceList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: Option<String>,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingTableRequest {
    pub table: RoutingTable,
}

/// The RPC surface a storage node exposes, from the perspective of a caller
/// (the router, or another storage node acting as coordinator).
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn ping(&self, addr: &NodeAddress) -> bool;
    async fn toggle_active(&self, addr: &NodeAddress) -> Result<()>;
    async fn set_routing_table(&self, addr: &NodeAddress, table: &RoutingTable) -> Result<()>;
    async fn put(&self, addr: &NodeAddress, req: PutRequest) -> Result<PutOutcome>;
    async fn fetch(&self, addr: &NodeAddress, key: &str, is_primary: bool) -> Result<Option<String>>;
    async fn coordinator_put(
        &self,
        addr: &NodeAddress,
        key: &str,
        value: &str,
        preference_list: &[NodeAddress],
    ) -> Result<PutOutcome>;
    async fn get(
        &self,
        addr: &NodeAddress,
        key: &str,
        preference_list: &[NodeAddress],
    ) -> Result<(Option<String>, i32)>;
}

/// Real, HTTP/JSON implementation of [`NodeClient`].
pub struct HttpNodeClient {
    client: reqwest::Client,
}

impl Default for HttpNodeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpNodeClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client"),
        }
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn ping(&self, addr: &NodeAddress) -> bool {
        let url = format!("{}/ping", addr.base_url());
        match self.client.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<serde_json::Value>()
                .await
                .map(|v| v.get("active").and_then(|a| a.as_bool()).unwrap_or(false))
                .unwrap_or(false),
            _ => false,
        }
    }

    async fn toggle_active(&self, addr: &NodeAddress) -> Result<()> {
        let url = format!("{}/toggle-active", addr.base_url());
        self.client.post(url).send().await?;
        Ok(())
    }

    async fn set_routing_table(&self, addr: &NodeAddress, table: &RoutingTable) -> Result<()> {
        let url = format!("{}/routing-table", addr.base_url());
        self.client
            .post(url)
            .json(&RoutingTableRequest {
                table: table.clone(),
            })
            .send()
            .await?;
        Ok(())
    }

    async fn put(&self, addr: &NodeAddress, req: PutRequest) -> Result<PutOutcome> {
        let url = format!("{}/put", addr.base_url());
        let resp = self.client.post(url).json(&req).send().await?;
        decode_put_status(resp.json::<PutResponse>().await?.status)
    }

    async fn fetch(&self, addr: &NodeAddress, key: &str, is_primary: bool) -> Result<Option<String>> {
        let url = format!("{}/fetch/{}?primary={}", addr.base_url(), key, is_primary);
        let resp = self.client.get(url).send().await?;
        Ok(resp.json::<FetchResponse>().await?.value)
    }

    async fn coordinator_put(
        &self,
        addr: &NodeAddress,
        key: &str,
        value: &str,
        preference_list: &[NodeAddress],
    ) -> Result<PutOutcome> {
        let url = format!("{}/coordinator-put", addr.base_url());
        let resp = self
            .client
            .post(url)
            .json(&CoordinatorPutRequest {
                key: key.to_string(),
                value: value.to_string(),
                preference_list: preference_list.to_vec(),
            })
            .send()
            .await?;
        decode_put_status(resp.json::<PutResponse>().await?.status)
    }

    async fn get(
        &self,
        addr: &NodeAddress,
        key: &str,
        preference_list: &[NodeAddress],
    ) -> Result<(Option<String>, i32)> {
        let url = format!("{}/get", addr.base_url());
        let resp = self
            .client
            .post(url)
            .json(&GetRequest {
                key: key.to_string(),
                preference_list: preference_list.to_vec(),
            })
            .send()
            .await?;
        let body: GetResponse = resp.json().await?;
        Ok((body.value, body.status))
    }
}

fn decode_put_status(status: i32) -> Result<PutOutcome> {
    match status {
        0 => Ok(PutOutcome::Updated),
        1 => Ok(PutOutcome::Created),
        -2 => Err(StorageNodeError::Inactive),
        _ => Err(StorageNodeError::QuorumFailure(
            "replica reported failure".to_string(),
        )),
    }
}
