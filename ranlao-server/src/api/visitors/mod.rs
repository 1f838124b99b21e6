//! Visitor API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /enter | POST | 客人进入 (+1) | JWT / Basic |
//! | /leave | POST | 客人离开 (-1) | JWT / Basic |
//! | /count | GET | 当前人数 | 无 |
//! | /stat | GET | 前一日统计窗口 | JWT / Basic |
//! | /log | GET | 全部小时记录 (新→旧) | 无 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_device_auth;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let protected = Router::new()
        .route("/enter", post(handler::enter))
        .route("/leave", post(handler::leave))
        .route("/stat", get(handler::stat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_device_auth));

    Router::new()
        .route("/count", get(handler::count))
        .route("/log", get(handler::log))
        .merge(protected)
}
