//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::client::MessageResponse;
use shared::models::{DiningTable, DiningTableCreate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, dining_table};
use crate::utils::{AppError, AppResult, ErrorCode};

fn table_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::TableNotFound, msg),
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::TableNumberExists, msg),
        RepoError::Validation(msg) => AppError::with_message(ErrorCode::TableNumberInvalid, msg),
        other => other.into(),
    }
}

/// GET /table - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    Ok(Json(tables))
}

/// GET /table/{table_number} - 获取单个桌台
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(table_number): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::find_by_number(&state.pool, table_number)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TableNotFound,
                format!("Table {} not found", table_number),
            )
            .with_detail("table_number", table_number)
        })?;
    Ok(Json(table))
}

/// POST /table - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::create(&state.pool, payload)
        .await
        .map_err(table_error)?;
    tracing::info!(table_number = table.table_number, by = %user.username, "Table created");
    Ok(Json(table))
}

/// POST /call/{table_number} - 呼叫服务员
pub async fn call(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(table_number): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    dining_table::set_calling(&state.pool, table_number, true)
        .await
        .map_err(table_error)?;
    tracing::info!(table_number, by = %user.username, "Table calling staff");
    Ok(Json(MessageResponse::success()))
}

/// POST /complete/{table_number} - 服务完成，恢复非呼叫状态
pub async fn complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(table_number): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    dining_table::set_calling(&state.pool, table_number, false)
        .await
        .map_err(table_error)?;
    tracing::info!(table_number, by = %user.username, "Table call completed");
    Ok(Json(MessageResponse::success()))
}
