//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use shared::client::{LoginRequest, LoginResponse, UserStatus};

use crate::auth::CurrentUser;
use crate::auth::password::verify_password;
use crate::core::ServerState;
use crate::db::repository::account;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api-auth-token
///
/// Verifies credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let found = account::find_by_username(&state.pool, &req.username).await?;

    // Fixed delay before checking result
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let account = match found {
        Some(a) if verify_password(&req.password, &a.hash_pass) => a,
        Some(_) => {
            security_log!("WARN", "login_failed", username = req.username.as_str(), reason = "invalid_password");
            return Err(AppError::invalid_credentials());
        }
        None => {
            security_log!("WARN", "login_failed", username = req.username.as_str(), reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !account.is_active {
        security_log!("WARN", "login_disabled", username = req.username.as_str());
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let token = state
        .get_jwt_service()
        .generate_token(&account)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        account_id = account.id,
        username = %account.username,
        is_staff = account.is_staff,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        table: account.table_number,
        is_staff: account.is_staff,
    }))
}

/// GET /user-status
pub async fn user_status(user: CurrentUser) -> Json<UserStatus> {
    Json(UserStatus {
        username: user.username,
        table: user.table,
        is_staff: user.is_staff,
    })
}
