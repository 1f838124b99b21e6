//! 认证中间件
//!
//! 支持两种凭据：
//! - `Authorization: Bearer <jwt>` (也接受 `Token <jwt>`)，员工与顾客客户端
//! - `Authorization: Basic <base64(user:pass)>`，仅进出传感器相关接口

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;

use crate::auth::password::verify_password;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::repository::account;
use crate::security_log;
use crate::utils::{AppError, ErrorCode};

/// 凭据种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// 只接受 JWT (`Bearer` / `Token`)
    Token,
    /// JWT 或 HTTP Basic (进出传感器)
    TokenOrBasic,
}

/// 认证中间件 - 要求用户登录 (仅 JWT)
///
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 / Basic 凭据 | 401 TokenInvalid |
/// | 账号已停用 | 403 AccountDisabled |
pub async fn require_auth(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate_request(&state, AuthScheme::Token, req, next).await
}

/// 传感器认证中间件 - 额外接受 HTTP Basic
///
/// Basic 凭据错误返回 401 InvalidCredentials
pub async fn require_device_auth(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate_request(&state, AuthScheme::TokenOrBasic, req, next).await
}

async fn authenticate_request(
    state: &ServerState,
    scheme: AuthScheme,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS 预检
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Body 不是 Sync，await 期间只借用 Parts
    let (mut parts, body) = req.into_parts();
    let user = authenticate(state, scheme, &parts.headers, parts.uri.path()).await?;
    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// 解析 Authorization 头得到当前用户
pub async fn authenticate(
    state: &ServerState,
    scheme: AuthScheme,
    headers: &HeaderMap,
    path: &str,
) -> Result<CurrentUser, AppError> {
    let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        security_log!("WARN", "auth_missing", uri = path);
        return Err(AppError::unauthorized());
    };

    if let Some(encoded) = header.strip_prefix("Basic ") {
        if scheme != AuthScheme::TokenOrBasic {
            security_log!("WARN", "basic_not_allowed", uri = path);
            return Err(AppError::invalid_token("Basic authentication not accepted here"));
        }
        return authenticate_basic(state, encoded.trim(), path).await;
    }

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let user = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => CurrentUser::try_from(claims)
            .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?,
        Err(e) => {
            security_log!("WARN", "auth_failed", error = e.to_string(), uri = path);
            return match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    // 令牌签发后账号可能被停用或删除
    match account::find_by_id(&state.pool, user.id).await? {
        Some(a) if a.is_active => Ok(user),
        _ => {
            security_log!("WARN", "account_disabled", user_id = user.id, uri = path);
            Err(AppError::new(ErrorCode::AccountDisabled))
        }
    }
}

async fn authenticate_basic(
    state: &ServerState,
    encoded: &str,
    path: &str,
) -> Result<CurrentUser, AppError> {
    let (username, password) = decode_basic(encoded).ok_or_else(|| {
        security_log!("WARN", "basic_malformed", uri = path);
        AppError::invalid_credentials()
    })?;

    let found = account::find_by_username(&state.pool, &username).await?;
    let account = match found {
        Some(a) if verify_password(&password, &a.hash_pass) => a,
        _ => {
            security_log!("WARN", "basic_failed", username = username.as_str(), uri = path);
            return Err(AppError::invalid_credentials());
        }
    };
    if !account.is_active {
        security_log!("WARN", "account_disabled", username = username.as_str(), uri = path);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    Ok(CurrentUser::from(&account))
}

/// `base64(user:pass)` → `(user, pass)`
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// 员工中间件 - 要求 `is_staff`
///
/// 必须位于 [`require_auth`] 之后。非员工返回 403 StaffRequired
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_staff {
        security_log!(
            "WARN",
            "staff_required",
            user_id = user.id,
            username = user.username.as_str()
        );
        return Err(AppError::new(ErrorCode::StaffRequired));
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 未认证返回 401
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::unauthorized())
    }
}
