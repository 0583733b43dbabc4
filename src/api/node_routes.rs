// Storage-node HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::NodeAppState;
use crate::error::{Result, StorageNodeError};
use crate::transport::{
    CoordinatorPutRequest, FetchResponse, GetRequest, GetResponse, PutRequest, PutResponse,
    RoutingTableRequest,
};

pub async fn ping(State(state): State<NodeAppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "active": state.node.ping() }))
}

pub async fn toggle_active(State(state): State<NodeAppState>) {
    state.node.toggle_active();
}

pub async fn set_routing_table(
    State(state): State<NodeAppState>,
    Json(req): Json<RoutingTableRequest>,
) {
    state.node.set_routing_table(req.table);
}

pub async fn put(
    State(state): State<NodeAppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    let status = match state.node.put(&req.key, &req.value, req.hint_target) {
        Ok(outcome) => outcome.status_code(),
        Err(StorageNodeError::Inactive) => -2,
        Err(e) => return Err(e),
    };
    Ok(Json(PutResponse { status }))
}

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    #[serde(default)]
    primary: bool,
}

pub async fn fetch(
    State(state): State<NodeAppState>,
    Path(key): Path<String>,
    Query(FetchQuery { primary }): Query<FetchQuery>,
) -> Json<FetchResponse> {
    Json(FetchResponse {
        value: state.node.fetch(&key, primary),
    })
}

pub async fn coordinator_put(
    State(state): State<NodeAppState>,
    Json(req): Json<CoordinatorPutRequest>,
) -> Result<Json<PutResponse>> {
    let status = match state
        .node
        .coordinator_put(&req.key, &req.value, &req.preference_list)
        .await
    {
        Ok(outcome) => outcome.status_code(),
        Err(StorageNodeError::Inactive) => -2,
        Err(StorageNodeError::QuorumFailure(_)) => -1,
        Err(e) => return Err(e),
    };
    Ok(Json(PutResponse { status }))
}

pub async fn get(
    State(state): State<NodeAppState>,
    Json(req): Json<GetRequest>,
) -> Result<Json<GetResponse>> {
    let (value, status) = state.node.get(&req.key, &req.preference_list).await?.into_parts();
    Ok(Json(GetResponse { value, status }))
}

#[derive(Debug, serde::Serialize)]
pub struct DeleteResponse {
    pub existed: bool,
}

pub async fn delete(
    State(state): State<NodeAppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    Json(DeleteResponse {
        existed: state.node.delete(&key),
    })
}

#[derive(Debug, serde::Serialize)]
pub struct ListKeysResponse {
    pub keys: Vec<String>,
}

pub async fn list_keys(State(state): State<NodeAppState>) -> Json<ListKeysResponse> {
    Json(ListKeysResponse {
        keys: state.node.list_keys(),
    })
}
