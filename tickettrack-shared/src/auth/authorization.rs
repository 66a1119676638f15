/// Board access control
///
/// Every board or ticket operation enters through [`authorize`], which loads
/// the board once, resolves the caller's [`EffectiveRole`] and checks the
/// requested [`Capability`]. The resulting [`BoardContext`] is handed to the
/// operation so the board is not re-resolved.
///
/// # Decision table
///
/// | Capability    | Owner | Admin member | Member | Global admin member | Non-member |
/// |---------------|-------|--------------|--------|---------------------|------------|
/// | `Read`        | ✓     | ✓            | ✓      | ✓                   | ✗          |
/// | `Write`       | ✓     | ✓            | ✓      | ✓                   | ✗          |
/// | `Invite`      | ✓     | ✓            | ✓      | ✓                   | ✗          |
/// | `AdminDelete` | ✓     | ✓            | ✗      | ✓                   | ✗          |
///
/// A global `Admin` account gets nothing on boards it is not a member of.
///
/// # Example
///
/// ```no_run
/// use tickettrack_shared::auth::authorization::{authorize, Capability};
/// use tickettrack_shared::store::memory::MemoryStore;
/// # use tickettrack_shared::models::user::User;
///
/// # async fn example(user: User, board_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let ctx = authorize(&store, &user, board_id, Capability::Read).await?;
/// println!("{} is {:?} on {}", user.name, ctx.role, ctx.board.name);
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use crate::models::board::{Board, EffectiveRole};
use crate::models::user::{User, UserRole};
use crate::services::boards;
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Board {0} not found")]
    BoardNotFound(Uuid),

    #[error("Not a member of board {0}")]
    NotMember(Uuid),

    #[error("Requires admin role on board {0}")]
    AdminRequired(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Abstract permission checked against a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
    Invite,

    /// Deleting a ticket the caller did not create
    AdminDelete,
}

impl Capability {
    pub fn requires_admin(&self) -> bool {
        matches!(self, Capability::AdminDelete)
    }
}

/// Outcome of a successful authorization
#[derive(Debug, Clone)]
pub struct BoardContext {
    pub board: Board,
    pub role: EffectiveRole,
}

impl BoardContext {
    /// Whether the caller may exercise admin-only capabilities
    pub fn is_admin(&self, user: &User) -> bool {
        self.role.is_admin() || user.role == UserRole::Admin
    }
}

/// Pure decision over an already loaded board
///
/// # Errors
///
/// - `NotMember` if the user is neither owner nor in the member list
/// - `AdminRequired` if the capability is admin-only and neither the board
///   role nor the global role is admin
pub fn check_capability(
    board: &Board,
    user: &User,
    capability: Capability,
) -> Result<EffectiveRole, AuthzError> {
    let role = board
        .effective_role(user.id)
        .ok_or(AuthzError::NotMember(board.id))?;

    if capability.requires_admin() && !role.is_admin() && user.role != UserRole::Admin {
        return Err(AuthzError::AdminRequired(board.id));
    }

    Ok(role)
}

/// Loads a board and checks `capability` for `user`
///
/// # Errors
///
/// - `BoardNotFound` if the board does not exist
/// - see [`check_capability`]
pub async fn authorize(
    store: &dyn Store,
    user: &User,
    board_id: Uuid,
    capability: Capability,
) -> Result<BoardContext, AuthzError> {
    let board = boards::get(store, board_id)
        .await?
        .ok_or(AuthzError::BoardNotFound(board_id))?;

    match check_capability(&board, user, capability) {
        Ok(role) => Ok(BoardContext { board, role }),
        Err(err) => {
            tracing::debug!(
                board_id = %board_id,
                user_id = %user.id,
                capability = ?capability,
                "Access denied"
            );
            Err(err)
        }
    }
}
