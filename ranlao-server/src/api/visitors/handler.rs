//! Visitor API Handlers

use axum::{Json, extract::State};
use shared::client::{CountResponse, LogEntry, MessageResponse, StatPoint, StatResponse};
use shared::util::millis_to_datetime;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// POST /enter - 传感器上报进入
pub async fn enter(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    let bucket = state.ledger.enter(state.now()).await?;
    tracing::debug!(username = %user.username, amount = bucket.amount, "Visitor entered");
    Ok(Json(MessageResponse::success()))
}

/// POST /leave - 传感器上报离开
pub async fn leave(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    let bucket = state.ledger.leave(state.now()).await?;
    tracing::debug!(username = %user.username, amount = bucket.amount, "Visitor left");
    Ok(Json(MessageResponse::success()))
}

/// GET /count - 当前小时人数 (必要时补齐)
pub async fn count(State(state): State<ServerState>) -> AppResult<Json<CountResponse>> {
    let bucket = state.ledger.current(state.now()).await?;
    Ok(Json(CountResponse {
        amount: bucket.amount,
    }))
}

/// GET /stat - 前一日统计窗口
pub async fn stat(State(state): State<ServerState>) -> AppResult<Json<StatResponse>> {
    let buckets = state
        .ledger
        .statistics(state.now(), state.config.timezone, state.config.report_window)
        .await?;
    let stat = buckets
        .into_iter()
        .map(|b| StatPoint {
            date: millis_to_datetime(b.bucket_time),
            amount: b.amount,
        })
        .collect();
    Ok(Json(StatResponse { stat }))
}

/// GET /log - 全部记录
pub async fn log(State(state): State<ServerState>) -> AppResult<Json<Vec<LogEntry>>> {
    let entries = state
        .ledger
        .history()
        .await?
        .into_iter()
        .map(|b| LogEntry {
            log_time: millis_to_datetime(b.bucket_time),
            amount: b.amount,
        })
        .collect();
    Ok(Json(entries))
}
