//! CurrentUser extractor
//!
//! Handlers behind [`require_auth`](super::require_auth) get the user from
//! request extensions; elsewhere the Authorization header is checked here.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::auth::middleware::{AuthScheme, authenticate};
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(state, AuthScheme::Token, &parts.headers, parts.uri.path()).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
