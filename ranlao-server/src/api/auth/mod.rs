//! Auth API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api-auth-token | POST | 用户名密码换取 JWT | 无 |
//! | /user-status | GET | 当前用户信息 | 是 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_auth;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let protected = Router::new()
        .route("/user-status", get(handler::user_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api-auth-token", post(handler::login))
        .merge(protected)
}
