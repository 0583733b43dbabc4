// Router-service HTTP handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::RouterAppState;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct InitRequest {
    pub server_list: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: i32,
}

pub async fn init(
    State(state): State<RouterAppState>,
    Json(req): Json<InitRequest>,
) -> Json<StatusResponse> {
    let status = state.router.init(&req.server_list).await;
    Json(StatusResponse { status })
}

pub async fn destroy(State(state): State<RouterAppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.router.destroy(),
    })
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub value: Option<String>,
    pub status: i32,
}

pub async fn get(State(state): State<RouterAppState>, Path(key): Path<String>) -> Json<GetResponse> {
    let (value, status) = state.router.get(&key).await;
    Json(GetResponse { value, status })
}

#[derive(Debug, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
}

pub async fn put(
    State(state): State<RouterAppState>,
    Json(req): Json<PutRequest>,
) -> Json<StatusResponse> {
    let status = state.router.put(&req.key, &req.value).await;
    Json(StatusResponse { status })
}

pub async fn toggle_server(
    State(state): State<RouterAppState>,
    Path((host, port)): Path<(String, u16)>,
) -> Result<()> {
    state.router.toggle_server(&host, port).await
}
