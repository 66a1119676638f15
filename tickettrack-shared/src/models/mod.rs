/// Data model for TicketTrack
///
/// # Models
///
/// - `user`: User accounts and their public summaries
/// - `board`: Boards, member list, invitations, effective roles
/// - `ticket`: Tickets, comments, patches and list filters
/// - `view`: Responses with references resolved to summaries
///
/// # Example
///
/// ```
/// use tickettrack_shared::models::board::{Board, CreateBoard, EffectiveRole};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let board = Board::new(owner, CreateBoard {
///     name: "Sprint 1".to_string(),
///     description: None,
/// });
///
/// assert_eq!(board.ticket_prefix, "SPRINT1");
/// assert_eq!(board.effective_role(owner), Some(EffectiveRole::Owner));
/// ```

pub mod board;
pub mod ticket;
pub mod user;
pub mod view;
