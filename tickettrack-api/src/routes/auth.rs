/// Identity endpoints
///
/// - `POST /v1/auth/signup`: create an account, returns tokens and the user
/// - `POST /v1/auth/signin`: exchange email and password for tokens
/// - `POST /v1/auth/refresh`: exchange a refresh token for an access token
/// - `GET /v1/auth/me`: the authenticated caller
///
/// # Security
///
/// - Passwords are hashed with Argon2id and never returned
/// - Unknown email and wrong password produce the same `401` message
/// - Refresh tokens are rejected where access tokens are expected and vice versa

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tickettrack_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, User, UserRole},
    store::StoreError,
};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens plus the public user record
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Name is required".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            password_hash,
            name,
            role: UserRole::Member,
        })
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => {
                ApiError::Conflict("An account with this email already exists".to_string())
            }
            other => other.into(),
        })?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(SessionResponse { user, tokens })))
}

pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Sign-in with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(SessionResponse { user, tokens }))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = payload?;
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
    }))
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}
