/// Error handling for the API server
///
/// Every handler returns [`ApiResult`]. Library errors convert into
/// [`ApiError`] through `From`, and [`ApiError`] renders as
///
/// ```json
/// { "error": "forbidden", "message": "You are not a member of this board" }
/// ```
///
/// | Variant            | Status | `error` tag         |
/// |--------------------|--------|---------------------|
/// | `NotFound`         | 404    | `not_found`         |
/// | `Forbidden`        | 403    | `forbidden`         |
/// | `Conflict`         | 409    | `conflict`          |
/// | `InvalidInput`     | 400    | `invalid_input`     |
/// | `InvalidAssignee`  | 422    | `invalid_assignee`  |
/// | `Unauthorized`     | 401    | `unauthorized`      |
/// | `ValidationError`  | 422    | `validation_error`  |
/// | `InternalError`    | 500    | `internal_error`    |
///
/// Internal error details are logged, never returned.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tickettrack_shared::{
    auth::{
        authorization::AuthzError, jwt::JwtError, middleware::AuthError,
        password::PasswordError,
    },
    error::DomainError,
    store::StoreError,
};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    InvalidInput(String),
    InvalidAssignee(String),
    Unauthorized(String),

    /// Request body failed shape/syntax validation
    ValidationError(Vec<ValidationErrorDetail>),

    InternalError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Converts `validator` failures into field details
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidAssignee(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::InvalidAssignee(_) => "invalid_assignee",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApiError::InvalidAssignee(msg) => write!(f, "Invalid assignee: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.tag().to_string();

        let (message, details) = match self {
            ApiError::NotFound(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::InvalidAssignee(msg)
            | ApiError::Unauthorized(msg) => (msg, None),
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error,
                message,
                details,
            }),
        )
            .into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            err @ DomainError::InvalidAssignee(_) => ApiError::InvalidAssignee(err.to_string()),
            DomainError::Unauthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            DomainError::Store(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(err) => err.into(),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            other => ApiError::Unauthorized(format!("Invalid token: {}", other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "body".to_string(),
            message: rejection.body_text(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display() {
        let err = ApiError::InvalidInput("Title is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: Title is required");

        let err = ApiError::NotFound("Board not found".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found");
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN, "forbidden"),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT, "conflict"),
            (DomainError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "invalid_input"),
            (
                DomainError::InvalidAssignee(Uuid::new_v4()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_assignee",
            ),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED, "unauthorized"),
            (
                DomainError::Store("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (domain, status, tag) in cases {
            let api = ApiError::from(domain);
            assert_eq!(api.status(), status);
            assert_eq!(api.tag(), tag);
        }
    }

    #[test]
    fn test_gate_denials() {
        let board_id = Uuid::new_v4();
        assert_eq!(
            ApiError::from(AuthzError::BoardNotFound(board_id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthzError::NotMember(board_id)).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthzError::AdminRequired(board_id)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_error_response() {
        let response = ApiError::InternalError("db down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
