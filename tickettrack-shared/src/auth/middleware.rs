/// Request authentication
///
/// Resolves the caller of an HTTP request from its bearer token:
///
/// 1. `Authorization: Bearer <token>` is required
/// 2. the token must be a valid, unexpired **access** token
/// 3. the token subject must still exist in the store
///
/// On success an [`AuthContext`] carrying the full user record is inserted
/// into the request extensions for handlers to extract with
/// `Extension<AuthContext>`.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user.id
    }
}

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token subject no longer exists
    #[error("Unknown user")]
    UnknownUser,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, tag, message) = match &self {
            AuthError::Store(err) => {
                tracing::error!(error = %err, "Store error during authentication");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            other => (StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
        };

        (status, Json(json!({ "error": tag, "message": message }))).into_response()
    }
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves the caller identified by the request headers
///
/// # Errors
///
/// Every failure except a store failure is `Unauthenticated` in nature.
pub async fn authenticate(
    store: &dyn Store,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;

    let user = store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext::new(user))
}

/// Middleware body: authenticates and stores the [`AuthContext`] in extensions
pub async fn jwt_auth_middleware(
    store: &dyn Store,
    secret: &str,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = authenticate(store, secret, req.headers()).await?;

    tracing::debug!(user_id = %context.user.id, "Authenticated request");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
