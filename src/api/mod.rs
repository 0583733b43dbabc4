// HTTP API surface: one axum router per role.
//
// Storage nodes and the router expose disjoint route sets over the same
// `StorageNodeError -> IntoResponse` error handling, so both share the
// pattern but not a router.

pub mod node_routes;
pub mod router_routes;

use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::router::RouterService;
use crate::storage_node::StorageNode;

#[derive(Clone)]
pub struct NodeAppState {
    pub node: Arc<StorageNode>,
}

pub fn node_router(state: NodeAppState) -> Router {
    Router::new()
        .route("/ping", get(node_routes::ping))
        .route("/toggle-active", post(node_routes::toggle_active))
        .route("/routing-table", post(node_routes::set_routing_table))
        .route("/put", post(node_routes::put))
        .route("/fetch/:key", get(node_routes::fetch))
        .route("/coordinator-put", post(node_routes::coordinator_put))
        .route("/get", post(node_routes::get))
        .route("/store/:key", delete(node_routes::delete))
        .route("/keys", get(node_routes::list_keys))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Clone)]
pub struct RouterAppState {
    pub router: Arc<RouterService>,
}

pub fn router_router(state: RouterAppState) -> Router {
    Router::new()
        .route("/init", post(router_routes::init))
        .route("/destroy", post(router_routes::destroy))
        .route("/get/:key", get(router_routes::get))
        .route("/put", post(router_routes::put))
        .route("/toggle/:host/:port", post(router_routes::toggle_server))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
