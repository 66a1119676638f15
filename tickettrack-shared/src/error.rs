/// Domain error taxonomy
///
/// Every engine operation fails with a [`DomainError`]. Each variant is a
/// distinct kind the transport layer maps to its own status code.

use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Entity absent
    #[error("{0}")]
    NotFound(String),

    /// Authenticated but not authorized (non-member, non-admin, wrong invitee)
    #[error("{0}")]
    Forbidden(String),

    /// Duplicate pending invitation, duplicate member
    #[error("{0}")]
    Conflict(String),

    /// Empty required field, malformed reference
    #[error("{0}")]
    InvalidInput(String),

    /// Assignee is not a member of the board
    #[error("User {0} is not a member of this board")]
    InvalidAssignee(Uuid),

    #[error("Authentication required")]
    Unauthenticated,

    /// Persistence failure, never shown to clients verbatim
    #[error("Store error: {0}")]
    Store(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DomainError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(what) => DomainError::Conflict(format!("Already exists ({})", what)),
            StoreError::Backend(msg) => DomainError::Store(msg),
        }
    }
}

impl From<AuthzError> for DomainError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::BoardNotFound(_) => DomainError::NotFound("Board not found".to_string()),
            AuthzError::NotMember(_) => {
                DomainError::Forbidden("You are not a member of this board".to_string())
            }
            AuthzError::AdminRequired(_) => {
                DomainError::Forbidden("This action requires the admin role".to_string())
            }
            AuthzError::Store(err) => err.into(),
        }
    }
}
