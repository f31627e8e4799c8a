//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use tutoring_core::Role;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;
use crate::web::tokens::TokenKind;

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that validates the bearer access token.
///
/// If valid and not revoked, inserts an `AuthUser` into request extensions.
/// If invalid, missing or revoked, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.tokens.decode(token, TokenKind::Access)?;

    if state.accounts.is_token_revoked(&claims.jti).await? {
        warn!(user_id = %claims.sub, "Rejected revoked token");
        return Err(ApiError::Unauthorized("Token has been revoked".to_string()));
    }

    let auth_user = AuthUser {
        user_id: claims.sub,
        role: claims.role()?,
        token_id: claims.jti.clone(),
        expires_at: claims.expires_at(),
    };
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

fn require_role(req: &Request, role: Role) -> ApiResult<()> {
    let auth_user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;
    if auth_user.role != role {
        return Err(ApiError::Forbidden(format!("Only {}s can access this", role)));
    }
    Ok(())
}

/// Must run inside `require_auth`.
pub async fn require_student(req: Request, next: Next) -> ApiResult<Response> {
    require_role(&req, Role::Student)?;
    Ok(next.run(req).await)
}

/// Must run inside `require_auth`.
pub async fn require_expert(req: Request, next: Next) -> ApiResult<Response> {
    require_role(&req, Role::Expert)?;
    Ok(next.run(req).await)
}
