/// Board aggregate operations
///
/// None of these perform authorization. [`get`] is the raw fetch that
/// `auth::authorization::authorize` builds on before checking the caller's
/// role.

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::board::{Board, CreateBoard};
use crate::models::user::User;
use crate::models::view::{BoardView, UserIndex};
use crate::store::{Store, StoreError};

/// Maximum board name length, in characters
pub const MAX_BOARD_NAME_LEN: usize = 100;

/// Creates a board owned by `owner`
///
/// The owner is an implicit member and is not added to the member list.
///
/// # Errors
///
/// `InvalidInput` if the name is blank or too long
pub async fn create_board(store: &dyn Store, owner: &User, data: CreateBoard) -> DomainResult<Board> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidInput("Board name is required".to_string()));
    }
    if name.chars().count() > MAX_BOARD_NAME_LEN {
        return Err(DomainError::InvalidInput(format!(
            "Board name must be at most {} characters",
            MAX_BOARD_NAME_LEN
        )));
    }

    let board = Board::new(owner.id, data);
    store.insert_board(&board).await?;

    tracing::info!(
        board_id = %board.id,
        user_id = %owner.id,
        ticket_prefix = %board.ticket_prefix,
        "Board created"
    );

    Ok(board)
}

/// Boards `user` owns or is a member of, newest first
pub async fn list_for_user(store: &dyn Store, user: &User) -> DomainResult<Vec<Board>> {
    Ok(store.list_boards_for_user(user.id).await?)
}

/// Raw fetch by id; `None` if the board does not exist
pub async fn get(store: &dyn Store, board_id: Uuid) -> Result<Option<Board>, StoreError> {
    store.find_board(board_id).await
}

/// Resolves owner and member references of several boards in one lookup
pub async fn board_views(
    store: &dyn Store,
    boards: Vec<Board>,
    viewer: Uuid,
) -> DomainResult<Vec<BoardView>> {
    let mut ids: Vec<Uuid> = boards
        .iter()
        .flat_map(|b| std::iter::once(b.owner_id).chain(b.members.iter().map(|m| m.user_id)))
        .collect();
    ids.sort();
    ids.dedup();

    let users: UserIndex = store
        .find_users_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();

    Ok(boards
        .into_iter()
        .map(|b| BoardView::build(b, viewer, &users))
        .collect())
}

pub async fn board_view(store: &dyn Store, board: Board, viewer: Uuid) -> DomainResult<BoardView> {
    board_views(store, vec![board], viewer)
        .await?
        .pop()
        .ok_or_else(|| DomainError::Store("Board view could not be built".to_string()))
}
