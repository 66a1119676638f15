/// Membership & invitation engine
///
/// ```text
/// invite ──► pending ──accept──► accepted
///               │
///               └── declined   (reserved, never set)
/// ```
///
/// Acceptance is one-shot: once an invitation has left `pending` a second
/// acceptance finds nothing to accept and fails with `NotFound`.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::authorization::BoardContext;
use crate::error::{DomainError, DomainResult};
use crate::models::board::{Board, Invitation, Member, MemberRole};
use crate::models::user::{normalize_email, User};
use crate::store::{Store, StoreError};

/// Membership query: owner or member-list entry
pub fn is_member(board: &Board, user_id: Uuid) -> bool {
    board.is_member(user_id)
}

/// Role query; `None` for non-members
pub fn role_of(board: &Board, user_id: Uuid) -> Option<MemberRole> {
    board.role_of(user_id)
}

/// Invites `email` to the board in `ctx`
///
/// The caller must already hold the `Invite` capability on the board.
///
/// # Errors
///
/// - `InvalidInput` if the email is blank
/// - `Conflict` if the address belongs to a current member or already has a
///   pending invitation on this board
pub async fn invite(
    store: &dyn Store,
    ctx: &BoardContext,
    inviter: &User,
    email: &str,
) -> DomainResult<Invitation> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(DomainError::InvalidInput("Email is required".to_string()));
    }

    let board = &ctx.board;

    if board.pending_invitation_for(&email).is_some() {
        return Err(DomainError::Conflict(format!(
            "An invitation for {} is already pending",
            email
        )));
    }

    if let Some(existing) = store.find_user_by_email(&email).await? {
        if board.is_member(existing.id) {
            return Err(DomainError::Conflict(format!(
                "{} is already a member of this board",
                email
            )));
        }
    }

    let invitation = Invitation::pending(&email, inviter.id);
    store
        .add_invitation(board.id, &invitation)
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => DomainError::Conflict(format!(
                "An invitation for {} is already pending",
                email
            )),
            other => other.into(),
        })?;

    tracing::info!(
        board_id = %board.id,
        user_id = %inviter.id,
        invitation_id = %invitation.id,
        "Invitation created"
    );

    Ok(invitation)
}

/// Accepts the pending invitation addressed to `email` on `board_id`
///
/// Checks run in this order: addressee, board existence, pending invitation.
///
/// # Errors
///
/// - `Forbidden` if `email` is not the caller's own address
/// - `NotFound` if the board does not exist or has no pending invitation for `email`
/// - `Conflict` if the caller is already a member (owner included)
///
/// # Returns
///
/// The board after acceptance
pub async fn accept_invitation(
    store: &dyn Store,
    user: &User,
    board_id: Uuid,
    email: &str,
) -> DomainResult<Board> {
    if !user.has_email(email) {
        tracing::warn!(
            board_id = %board_id,
            user_id = %user.id,
            "Invitation acceptance for another address"
        );
        return Err(DomainError::Forbidden(
            "An invitation can only be accepted by its addressee".to_string(),
        ));
    }

    let board = store
        .find_board(board_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Board not found".to_string()))?;

    let invitation_id = board
        .pending_invitation_for(email)
        .map(|inv| inv.id)
        .ok_or_else(|| DomainError::NotFound("No pending invitation for this address".to_string()))?;

    if board.is_member(user.id) {
        return Err(DomainError::Conflict(
            "You are already a member of this board".to_string(),
        ));
    }

    let member = Member {
        user_id: user.id,
        role: MemberRole::Member,
        joined_at: Utc::now(),
    };

    store
        .accept_invitation(board_id, invitation_id, &member)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => {
                DomainError::NotFound("No pending invitation for this address".to_string())
            }
            StoreError::Conflict(_) => {
                DomainError::Conflict("You are already a member of this board".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(
        board_id = %board_id,
        user_id = %user.id,
        invitation_id = %invitation_id,
        "Invitation accepted"
    );

    store
        .find_board(board_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Board not found".to_string()))
}
