/// Persistence port
///
/// Every engine in this crate reads and writes through [`Store`], consumed as
/// `Arc<dyn Store>`. Two backends implement it:
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx
/// - [`memory::MemoryStore`]: process-local, for tests and local development
///
/// Operations that touch several rows (invitation acceptance, ticket deletion,
/// ticket numbering) are single atomic units in both backends.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::board::{Board, Invitation, Member};
use crate::models::ticket::{Comment, Ticket, TicketFilter};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Uniform error type for all storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_string(),
            ),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;

    // ── Users ──────────────────────────────────────────────

    /// Creates a user; `Conflict` if the email (case-insensitive) is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Bulk lookup; ids without a user are skipped
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    // ── Boards ─────────────────────────────────────────────

    async fn insert_board(&self, board: &Board) -> StoreResult<()>;

    /// Loads a board with its member and invitation lists in insertion order
    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>>;

    /// Boards the user owns or is a member of, newest first
    async fn list_boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>>;

    /// Appends an invitation
    ///
    /// `Conflict` if a pending invitation for the same email already exists on
    /// the board; `NotFound` if the board does not exist.
    async fn add_invitation(&self, board_id: Uuid, invitation: &Invitation) -> StoreResult<()>;

    /// Flips a pending invitation to accepted and appends `member`
    ///
    /// `NotFound` if the invitation is not pending anymore; `Conflict` if the
    /// user is already in the member list.
    async fn accept_invitation(
        &self,
        board_id: Uuid,
        invitation_id: Uuid,
        member: &Member,
    ) -> StoreResult<()>;

    /// Atomically increments the board's ticket counter and returns the new value
    async fn next_ticket_number(&self, board_id: Uuid) -> StoreResult<i64>;

    // ── Tickets ────────────────────────────────────────────

    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>>;

    /// Bulk lookup; ids without a ticket are skipped
    async fn find_tickets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ticket>>;

    /// Board tickets matching `filter`, newest first
    async fn list_tickets(&self, board_id: Uuid, filter: &TicketFilter)
        -> StoreResult<Vec<Ticket>>;

    /// Replaces the mutable fields of a stored ticket; comments are not touched
    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn append_comment(&self, ticket_id: Uuid, comment: &Comment) -> StoreResult<()>;

    /// Deletes a ticket and removes its id from every other blocker list
    ///
    /// Returns `false` if the ticket did not exist.
    async fn delete_ticket(&self, id: Uuid) -> StoreResult<bool>;
}
