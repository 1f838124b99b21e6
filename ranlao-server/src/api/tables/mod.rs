//! Dining Table API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /table | GET | 全部桌台 | 无 |
//! | /table/{table_number} | GET | 单个桌台 | 无 |
//! | /table | POST | 新建桌台 | 员工 |
//! | /call/{table_number} | POST | 呼叫服务员 | 是 |
//! | /complete/{table_number} | POST | 服务完成 | 是 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{require_auth, require_staff};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/table", get(handler::list))
        .route("/table/{table_number}", get(handler::get_by_number));

    let signal_routes = Router::new()
        .route("/call/{table_number}", post(handler::call))
        .route("/complete/{table_number}", post(handler::complete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // 外层先认证，再检查员工身份
    let manage_routes = Router::new()
        .route("/table", post(handler::create))
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    read_routes.merge(signal_routes).merge(manage_routes)
}
