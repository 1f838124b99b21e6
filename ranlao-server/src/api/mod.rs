//! HTTP API
//!
//! 路由按领域拆分，认证在各自的 router 内通过 `route_layer` 挂载。

pub mod auth;
pub mod health;
pub mod tables;
pub mod visitors;

use std::time::Duration;

use axum::Router;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no global middleware, no state)
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(visitors::router(state))
        .merge(tables::router(state))
}

/// Build the fully configured application
///
/// 末尾斜杠在路由匹配前去除 (`/enter/` 与 `/enter` 等价)
pub fn build_app(state: ServerState) -> NormalizePath<Router> {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let router = build_router(&state)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
