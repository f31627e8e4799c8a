//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, signin, Google sign-in, token refresh,
//! logout, and the current user.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{error, info};
use tutoring_core::domain::{GoogleIdentity, NewUser, Role, User};
use tutoring_core::ports::PortError;

use crate::error::{ApiError, ApiResult};
use crate::web::dto::{
    AuthResponse, CurrentUserResponse, GoogleCallbackQuery, GoogleLoginQuery, GoogleTokenRequest,
    MessageResponse, RefreshRequest, RegisterRequest, SigninRequest, TokenResponse,
};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use crate::web::tokens::TokenKind;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Helpers
//=========================================================================================

/// Only students and experts can sign themselves up.
fn signup_role(raw: &str) -> ApiResult<Role> {
    match raw.parse::<Role>() {
        Ok(role @ (Role::Student | Role::Expert)) => Ok(role),
        _ => Err(ApiError::Validation(
            "role must be 'student' or 'expert'".to_string(),
        )),
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("password hashing failed".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("stored password hash is malformed".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let pair = state.tokens.issue_pair(user.id, user.role)?;
    Ok(AuthResponse {
        user: user.into(),
        tokens: pair.into(),
    })
}

fn identity_error(e: PortError) -> ApiError {
    match e {
        PortError::Unauthorized => ApiError::Unauthorized("Invalid Google credentials".to_string()),
        other => ApiError::Upstream(other.to_string()),
    }
}

/// Returns the account registered under the Google email, creating it on first sign-in.
async fn find_or_create_google_user(
    state: &AppState,
    identity: GoogleIdentity,
    role: Role,
) -> ApiResult<User> {
    match state.accounts.get_credentials_by_email(&identity.email).await {
        Ok(credentials) => Ok(credentials.user),
        Err(PortError::NotFound(_)) => {
            let user = state
                .accounts
                .create_user(NewUser {
                    full_name: identity.name,
                    email: identity.email,
                    picture: identity.picture,
                    phone: None,
                    hashed_password: None,
                    role,
                })
                .await?;
            info!(user_id = %user.id, role = %user.role, "Created account from Google sign-in");
            Ok(user)
        }
        Err(e) => Err(e.into()),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email or phone number already registered")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = signup_role(&req.role)?;
    let full_name = req.full_name.trim().to_string();
    let email = req.email.trim().to_string();

    if full_name.is_empty() {
        return Err(ApiError::Validation("full_name is required".to_string()));
    }
    if !looks_like_email(&email) {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(ApiError::Validation("passwords do not match".to_string()));
    }

    let hashed_password = hash_password(&req.password)?;
    let phone = req
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let user = state
        .accounts
        .create_user(NewUser {
            full_name,
            email,
            picture: None,
            phone,
            hashed_password: Some(hashed_password),
            role,
        })
        .await?;
    info!(user_id = %user.id, role = %user.role, "Registered new user");

    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

/// POST /auth/signin - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signin successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let credentials = match state.accounts.get_credentials_by_email(req.email.trim()).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    // Accounts created through Google have no password.
    let hashed = credentials
        .hashed_password
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, hashed)? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(issue_tokens(&state, credentials.user)?))
}

/// POST /auth/google/login - Sign in with a Google ID token
#[utoipa::path(
    post,
    path = "/auth/google/login",
    request_body = GoogleTokenRequest,
    responses(
        (status = 200, description = "Signin successful", body = AuthResponse),
        (status = 401, description = "Google token rejected"),
        (status = 502, description = "Google unreachable")
    ),
    tag = "auth"
)]
pub async fn google_token_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let role = signup_role(req.role.as_deref().unwrap_or("student"))?;
    let identity = state
        .identity
        .verify_id_token(&req.token)
        .await
        .map_err(identity_error)?;

    let user = find_or_create_google_user(&state, identity, role).await?;
    Ok(Json(issue_tokens(&state, user)?))
}

/// GET /auth/google/login - Redirect to Google's consent screen
#[utoipa::path(
    get,
    path = "/auth/google/login",
    params(("role" = Option<String>, Query, description = "Role for first-time sign-ins")),
    responses((status = 307, description = "Redirect to Google")),
    tag = "auth"
)]
pub async fn google_redirect_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoogleLoginQuery>,
) -> ApiResult<Redirect> {
    let role = signup_role(query.role.as_deref().unwrap_or("student"))?;
    Ok(Redirect::temporary(
        &state.identity.authorization_url(role.as_str()),
    ))
}

/// GET /auth/google/callback - Finish the Google redirect flow
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(
        ("code" = String, Query, description = "Authorization code from Google"),
        ("state" = Option<String>, Query, description = "Role passed through the consent screen")
    ),
    responses(
        (status = 200, description = "Signin successful", body = AuthResponse),
        (status = 401, description = "Code rejected"),
        (status = 502, description = "Google unreachable")
    ),
    tag = "auth"
)]
pub async fn google_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoogleCallbackQuery>,
) -> ApiResult<Json<AuthResponse>> {
    let requested = query
        .role
        .as_deref()
        .or(query.state.as_deref())
        .unwrap_or("student");
    let role = signup_role(requested)?;

    let identity = state
        .identity
        .exchange_code(&query.code)
        .await
        .map_err(identity_error)?;

    let user = find_or_create_google_user(&state, identity, role).await?;
    Ok(Json(issue_tokens(&state, user)?))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New tokens", body = TokenResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = state.tokens.decode(&req.refresh_token, TokenKind::Refresh)?;

    let user = match state.accounts.get_user_by_id(claims.sub).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("Unknown user".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    // Rotation: the presented refresh token is single-use. Revoking it is the
    // conditional write, so of two concurrent refreshes only one gets a pair.
    let first_use = state
        .accounts
        .revoke_token(&claims.jti, claims.expires_at())
        .await?;
    if !first_use {
        return Err(ApiError::Unauthorized("Token has been revoked".to_string()));
    }

    let pair = state.tokens.issue_pair(user.id, user.role)?;
    Ok(Json(pair.into()))
}

/// POST /auth/logout - Revoke the presented access token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .accounts
        .revoke_token(&auth.token_id, auth.expires_at)
        .await?;
    info!(user_id = %auth.user_id, "User logged out");
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// GET /auth/user - The authenticated user
#[utoipa::path(
    get,
    path = "/auth/user",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn current_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<CurrentUserResponse>> {
    let user = state.accounts.get_user_by_id(auth.user_id).await?;
    Ok(Json(CurrentUserResponse {
        id: user.id,
        role: user.role.as_str().to_string(),
        full_name: user.full_name,
        email: user.email,
    }))
}
